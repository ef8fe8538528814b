use thiserror::Error;

/// Errors raised while building the metrics middleware or its recorder
#[derive(Debug, Error)]
pub enum MetricsError {
    #[cfg(feature = "observability")]
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Invalid recorder configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
