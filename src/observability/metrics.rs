//! Prometheus metrics.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and start the scrape endpoint.
///
/// Failure to start metrics is logged but never fatal; the gateway keeps
/// serving traffic without them.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics endpoint started"),
        Err(error) => tracing::error!(error = %error, "failed to start metrics endpoint"),
    }
}

/// Record one dispatched request, labeled by method, status and tenant.
pub fn record_request(method: &str, status: u16, tenant: &str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();

    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "tenant" => tenant.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "tenant" => tenant.to_string()
    )
    .record(elapsed);
}

/// Track the number of live WebSocket upgrade sessions.
pub fn upgrade_session_opened() {
    metrics::gauge!("gateway_upgrade_sessions").increment(1.0);
}

pub fn upgrade_session_closed() {
    metrics::gauge!("gateway_upgrade_sessions").decrement(1.0);
}
