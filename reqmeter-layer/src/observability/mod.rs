//! Prometheus backend for the metrics middleware.
//!
//! Only available when the `observability` feature is enabled.

mod handler;
mod prometheus_recorder;

pub use handler::{metrics_handler, metrics_routes};
pub use prometheus_recorder::{PrometheusRecorder, PrometheusRecorderBuilder, DEFAULT_NAMESPACE};
