use super::prometheus_recorder::PrometheusRecorder;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::TextEncoder;
use std::sync::Arc;
use tracing::error;

/// Prometheus metrics endpoint handler
pub async fn metrics_handler(State(recorder): State<Arc<PrometheusRecorder>>) -> Response {
    let encoder = TextEncoder::new();
    let metric_families = recorder.registry().gather();

    match encoder.encode_to_string(&metric_families) {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            output,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Router serving the exposition of `recorder` at `path`
pub fn metrics_routes(path: &str, recorder: Arc<PrometheusRecorder>) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(recorder)
}
