//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): requests by outcome
//! - `router_dispatch_duration_seconds` (histogram): time spent in the site
//! - `router_retries_total` (counter): rejected attempts retried
//! - `router_static_fallback_total` (counter): module assets served after a miss
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Prometheus exporter is opt-in via config

use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request. `outcome` is `ok`, `not_found`, `error`,
/// `forbidden` or `static`.
pub fn record_dispatch(outcome: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "router_dispatch_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("router_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry() {
    ::metrics::counter!("router_retries_total").increment(1);
}

pub fn record_static_fallback() {
    ::metrics::counter!("router_static_fallback_total").increment(1);
}
