//! Metrics collection and exposition.
//!
//! # Metrics
//! - `healthcheck_requests_total` (counter): liveness probes answered
//! - `body_parser_rejections_total` (counter): bodies refused, by reason
//! - `source_reload_events_total` (counter): watcher events forwarded
//! - `module_cache_evictions_total` (counter): cache entries dropped on reload
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_healthcheck() {
    metrics::counter!("healthcheck_requests_total").increment(1);
}

pub fn record_body_rejection(reason: &'static str) {
    metrics::counter!("body_parser_rejections_total", "reason" => reason).increment(1);
}

pub fn record_reload_event() {
    metrics::counter!("source_reload_events_total").increment(1);
}

pub fn record_cache_evictions(count: usize) {
    metrics::counter!("module_cache_evictions_total").increment(count as u64);
}
