use super::model::MetricsConfig;
use crate::attribute::{AttributesFn, KeyValue};
use crate::recorder::Recorder;
use axum::extract::Request;
use std::fmt;
use std::sync::Arc;

/// A single configuration change, applied to a [`MetricsConfig`] before the
/// middleware is built.
///
/// Options hold no state besides their argument and can be applied any number
/// of times, to any number of configurations. Later options overwrite earlier
/// ones.
#[derive(Clone)]
pub enum MetricsOption {
    Attributes(AttributesFn),
    RecordInFlightDisabled,
    RecordDurationDisabled,
    RecordSizeDisabled,
    GroupedStatusDisabled,
    Recorder(Arc<dyn Recorder>),
}

impl MetricsOption {
    /// Replace the function computing the attributes of each request.
    /// `default_attributes` is used otherwise.
    pub fn with_attributes<F>(attributes: F) -> Self
    where
        F: Fn(&str, &str, &Request) -> Vec<KeyValue> + Send + Sync + 'static,
    {
        MetricsOption::Attributes(Arc::new(attributes))
    }

    /// Stop tracking in-flight requests. The argument is not consulted.
    pub fn with_record_in_flight_disabled(_record_in_flight: bool) -> Self {
        MetricsOption::RecordInFlightDisabled
    }

    /// Stop recording request durations. The argument is not consulted.
    pub fn with_record_duration_disabled(_record_duration: bool) -> Self {
        MetricsOption::RecordDurationDisabled
    }

    /// Stop recording request and response sizes. The argument is not consulted.
    pub fn with_record_size_disabled(_record_size: bool) -> Self {
        MetricsOption::RecordSizeDisabled
    }

    /// Record exact status codes instead of their class (200, 300, ...).
    pub fn with_grouped_status_disabled() -> Self {
        MetricsOption::GroupedStatusDisabled
    }

    /// Swap the metrics backend.
    pub fn with_recorder(recorder: Arc<dyn Recorder>) -> Self {
        MetricsOption::Recorder(recorder)
    }

    pub fn apply(&self, config: &mut MetricsConfig) {
        match self {
            MetricsOption::Attributes(attributes) => config.attributes = attributes.clone(),
            MetricsOption::RecordInFlightDisabled => config.record_in_flight = false,
            MetricsOption::RecordDurationDisabled => config.record_duration = false,
            MetricsOption::RecordSizeDisabled => config.record_size = false,
            MetricsOption::GroupedStatusDisabled => config.grouped_status = false,
            MetricsOption::Recorder(recorder) => config.recorder = Some(recorder.clone()),
        }
    }
}

impl fmt::Debug for MetricsOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsOption::Attributes(_) => write!(f, "Attributes(<fn>)"),
            MetricsOption::RecordInFlightDisabled => write!(f, "RecordInFlightDisabled"),
            MetricsOption::RecordDurationDisabled => write!(f, "RecordDurationDisabled"),
            MetricsOption::RecordSizeDisabled => write!(f, "RecordSizeDisabled"),
            MetricsOption::GroupedStatusDisabled => write!(f, "GroupedStatusDisabled"),
            MetricsOption::Recorder(_) => write!(f, "Recorder(<dyn Recorder>)"),
        }
    }
}
