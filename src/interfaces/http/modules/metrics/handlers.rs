//! `GET /metrics` and metric descriptions
//!
//! Booking counters are recorded where they happen (reconciler, conflict
//! checks, notification dispatcher); this module only describes and
//! exports them.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// Prometheus text exposition (no auth)
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}

/// Register help texts with the installed recorder.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "reservations_created_total",
        "Reservations written, labelled by payment method"
    );
    metrics::describe_counter!(
        "reservation_conflicts_total",
        "Booking attempts refused because the dates overlap an existing stay"
    );
    metrics::describe_counter!(
        "notifications_failed_total",
        "Notifications that failed or timed out"
    );
    metrics::describe_counter!("http_requests_total", "HTTP requests by route and status");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        metrics::Unit::Seconds,
        "HTTP request latency by route"
    );
}
