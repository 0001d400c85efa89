//! Metrics collection and exposition.
//!
//! # Metrics
//! - `l2d_requests_total` (counter): proxied requests by status
//! - `l2d_redirects_total` (counter): cross-domain redirects by rule
//! - `l2d_rewrites_total` (counter): rewritten URLs by shape
//! - `l2d_rewrite_duration_seconds` (histogram): time spent rewriting one body
//!
//! Without an installed recorder every call is a no-op, so the library
//! can be used without the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16) {
    metrics::counter!("l2d_requests_total", "status" => status.to_string()).increment(1);
}

pub fn record_redirect(rule: &'static str) {
    metrics::counter!("l2d_redirects_total", "rule" => rule).increment(1);
}

pub fn record_rewrites(shape: &'static str, count: usize) {
    if count > 0 {
        metrics::counter!("l2d_rewrites_total", "shape" => shape).increment(count as u64);
    }
}

pub fn record_rewrite_duration(elapsed: Duration) {
    metrics::histogram!("l2d_rewrite_duration_seconds").record(elapsed.as_secs_f64());
}
