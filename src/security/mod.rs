//! Security response headers.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → headers.rs (baseline set, frame guard by mode, hide X-Powered-By)
//!     → no_cache.rs (forbid client and proxy caching)
//!     → csp.rs (Content-Security-Policy from settings)
//! ```
//!
//! # Design Decisions
//! - Header values are fixed; only the frame guard and CSP are configurable
//! - A CSP that cannot form a valid header fails configuration, not requests

pub mod csp;
pub mod headers;
pub mod no_cache;

pub use csp::{ContentSecurityPolicy, CspError};
pub use headers::SecurityHeaders;
