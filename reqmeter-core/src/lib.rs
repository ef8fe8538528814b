//! reqmeter Core Library
//!
//! Shared pieces of the reqmeter HTTP metrics middleware:
//! - Metrics configuration, its builder and option values
//! - Request attributes and the default attribute set
//! - The recorder abstraction implemented by metrics backends
//! - File based settings

pub mod attribute;
pub mod config;
pub mod recorder;

// Re-export commonly used types
pub use attribute::{default_attributes, semconv, AttributesFn, KeyValue, Value};
pub use config::{
    MetricsConfig, MetricsConfigBuilder, MetricsOption, MetricsSettings, ServerSettings, Settings,
};
pub use recorder::{NoopRecorder, Recorder};
