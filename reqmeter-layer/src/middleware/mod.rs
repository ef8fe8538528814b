pub mod metrics;
pub mod size;

pub use metrics::{
    build_metrics_layer, status_attribute, MetricsLayer, MetricsService, UNMATCHED_ROUTE,
};
pub use size::{approximate_request_size, response_size};
