//! Liveness endpoint.
//!
//! # Design Decisions
//! - Answers `OK!` whenever the process can serve a request at all
//! - Probes nothing else: an orchestrator restarting on failure should only
//!   restart a process that has stopped responding

use crate::observability::metrics;

pub const HEALTHCHECK_PATH: &str = "/healthcheck";

pub const HEALTHCHECK_BODY: &str = "OK!";

/// `GET /healthcheck` handler.
pub async fn healthcheck() -> &'static str {
    metrics::record_healthcheck();
    HEALTHCHECK_BODY
}
