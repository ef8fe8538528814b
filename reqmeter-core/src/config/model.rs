use super::option::MetricsOption;
use crate::attribute::{default_attributes, AttributesFn, KeyValue};
use crate::recorder::Recorder;
use axum::extract::Request;
use std::fmt;
use std::sync::Arc;

/// Configuration read by the metrics middleware.
///
/// Built once at startup, either through [`MetricsConfig::builder`] or by
/// folding a list of [`MetricsOption`] over the defaults with
/// [`MetricsConfig::with_options`]. The middleware never mutates it.
#[derive(Clone)]
pub struct MetricsConfig {
    pub(crate) attributes: AttributesFn,
    pub(crate) record_in_flight: bool,
    pub(crate) record_duration: bool,
    pub(crate) record_size: bool,
    pub(crate) grouped_status: bool,
    pub(crate) recorder: Option<Arc<dyn Recorder>>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            attributes: Arc::new(default_attributes),
            record_in_flight: true,
            record_duration: true,
            record_size: true,
            grouped_status: true,
            recorder: None,
        }
    }
}

impl MetricsConfig {
    pub fn builder() -> MetricsConfigBuilder {
        MetricsConfigBuilder::new()
    }

    /// Apply `options` left to right on top of the defaults.
    pub fn with_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = MetricsOption>,
    {
        let mut config = Self::default();
        for option in options {
            option.apply(&mut config);
        }
        config
    }

    /// Compute the attributes of a request with the configured function.
    pub fn attributes(&self, server_name: &str, route: &str, request: &Request) -> Vec<KeyValue> {
        (self.attributes)(server_name, route, request)
    }

    pub fn record_in_flight(&self) -> bool {
        self.record_in_flight
    }

    pub fn record_duration(&self) -> bool {
        self.record_duration
    }

    pub fn record_size(&self) -> bool {
        self.record_size
    }

    pub fn grouped_status(&self) -> bool {
        self.grouped_status
    }

    /// The configured recorder, `None` when the middleware should pick its default.
    pub fn recorder(&self) -> Option<&Arc<dyn Recorder>> {
        self.recorder.as_ref()
    }
}

impl fmt::Debug for MetricsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsConfig")
            .field("record_in_flight", &self.record_in_flight)
            .field("record_duration", &self.record_duration)
            .field("record_size", &self.record_size)
            .field("grouped_status", &self.grouped_status)
            .field("recorder", &self.recorder.as_ref().map(|_| "<dyn Recorder>"))
            .finish_non_exhaustive()
    }
}

/// Builder for MetricsConfig
///
/// Every setter goes through [`MetricsOption::apply`], so chaining setters and
/// passing the equivalent option list to [`MetricsConfig::with_options`] give
/// the same configuration.
#[must_use = "builder does nothing until you call build()"]
pub struct MetricsConfigBuilder {
    config: MetricsConfig,
}

impl MetricsConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: MetricsConfig::default(),
        }
    }

    pub fn option(mut self, option: MetricsOption) -> Self {
        option.apply(&mut self.config);
        self
    }

    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = MetricsOption>,
    {
        for option in options {
            option.apply(&mut self.config);
        }
        self
    }

    pub fn attributes<F>(self, attributes: F) -> Self
    where
        F: Fn(&str, &str, &Request) -> Vec<KeyValue> + Send + Sync + 'static,
    {
        self.option(MetricsOption::with_attributes(attributes))
    }

    pub fn record_in_flight_disabled(self, record_in_flight: bool) -> Self {
        self.option(MetricsOption::with_record_in_flight_disabled(record_in_flight))
    }

    pub fn record_duration_disabled(self, record_duration: bool) -> Self {
        self.option(MetricsOption::with_record_duration_disabled(record_duration))
    }

    pub fn record_size_disabled(self, record_size: bool) -> Self {
        self.option(MetricsOption::with_record_size_disabled(record_size))
    }

    pub fn grouped_status_disabled(self) -> Self {
        self.option(MetricsOption::with_grouped_status_disabled())
    }

    pub fn recorder(self, recorder: Arc<dyn Recorder>) -> Self {
        self.option(MetricsOption::with_recorder(recorder))
    }

    pub fn build(self) -> MetricsConfig {
        self.config
    }
}

impl Default for MetricsConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
