//! reqmeter HTTP metrics middleware
//!
//! A Tower layer for axum that records request counts, durations, sizes and
//! in-flight requests through a pluggable [`Recorder`].
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use reqmeter_layer::{build_metrics_layer, MetricsConfig};
//!
//! # fn main() -> Result<(), reqmeter_layer::MetricsError> {
//! let config = MetricsConfig::builder()
//!     .record_size_disabled(true)
//!     .build();
//!
//! let app: Router = Router::new()
//!     .route("/users/{id}", get(|| async { "user" }))
//!     .layer(build_metrics_layer("users", config)?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod middleware;
#[cfg(feature = "observability")]
pub mod observability;

pub use error::MetricsError;
pub use middleware::{build_metrics_layer, MetricsLayer, MetricsService};
#[cfg(feature = "observability")]
pub use observability::{metrics_handler, metrics_routes, PrometheusRecorder};
pub use reqmeter_core::{
    default_attributes, KeyValue, MetricsConfig, MetricsOption, NoopRecorder, Recorder,
};
