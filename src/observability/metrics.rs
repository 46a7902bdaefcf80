//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): inbound requests by method, status
//! - `proxy_request_duration_seconds` (histogram): inbound latency
//! - `proxy_upstream_requests_total` (counter): vendor calls by method, kind, status
//! - `proxy_upstream_duration_seconds` (histogram): vendor latency
//! - `poller_attempts_total` (counter): status queries issued by the poller
//! - `poller_outcomes_total` (counter): terminal poll results by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::upstream::types::JobKind;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed inbound request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("proxy_requests_total", "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    histogram!("proxy_request_duration_seconds", "method" => method.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record a vendor call. `status` is `None` when no response arrived.
pub fn record_upstream(method: &str, kind: JobKind, status: Option<u16>, start: Instant) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
    let kind = kind.as_str();
    counter!(
        "proxy_upstream_requests_total",
        "method" => method.to_string(),
        "kind" => kind,
        "status" => status
    )
    .increment(1);
    histogram!("proxy_upstream_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_poll_attempt() {
    counter!("poller_attempts_total").increment(1);
}

pub fn record_poll_outcome(outcome: &'static str) {
    counter!("poller_outcomes_total", "outcome" => outcome).increment(1);
}
