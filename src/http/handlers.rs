use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::observability::MetricsRegistry;

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// `GET /metrics`: render the current registry.
pub async fn get_metrics(State(registry): State<MetricsRegistry>) -> impl IntoResponse {
    registry.record_scrape();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        registry.render(),
    )
}
