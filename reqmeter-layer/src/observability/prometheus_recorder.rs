use crate::error::{MetricsError, Result};
use once_cell::sync::OnceCell;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry};
use reqmeter_core::{semconv, KeyValue, Recorder, Value};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

pub const DEFAULT_NAMESPACE: &str = "http_server";

const DEFAULT_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static GLOBAL_RECORDER: OnceCell<Arc<PrometheusRecorder>> = OnceCell::new();

/// Recorder exporting request metrics through a Prometheus registry
///
/// Prometheus vectors need a fixed label set, so the recorder maps attributes
/// onto the label keys it was built with: a missing attribute becomes an empty
/// label value and attributes with other keys are dropped.
#[derive(Clone)]
pub struct PrometheusRecorder {
    pub requests_total: IntCounterVec,
    pub request_duration_seconds: HistogramVec,
    pub request_size_bytes: HistogramVec,
    pub response_size_bytes: HistogramVec,
    pub active_requests: IntGaugeVec,
    label_keys: Arc<[String]>,
    registry: Registry,
}

impl PrometheusRecorder {
    /// Recorder with the default namespace, label keys and buckets on a fresh registry
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> PrometheusRecorderBuilder {
        PrometheusRecorderBuilder::new()
    }

    /// Process-wide recorder, created on first use.
    ///
    /// This is the recorder picked by the metrics layer when its configuration
    /// carries none.
    pub fn global() -> Result<Arc<Self>> {
        GLOBAL_RECORDER
            .get_or_try_init(|| Self::new().map(Arc::new))
            .cloned()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Attribute keys mapped to labels, in label order
    pub fn label_keys(&self) -> &[String] {
        &self.label_keys
    }

    /// Label values in label order; string attributes are borrowed.
    fn label_values<'a>(&self, attributes: &'a [KeyValue]) -> Vec<Cow<'a, str>> {
        if tracing::enabled!(tracing::Level::TRACE) {
            for kv in attributes {
                if !self.label_keys.iter().any(|key| kv.key == key.as_str()) {
                    trace!("Dropping attribute {} not in label set", kv.key);
                }
            }
        }

        self.label_keys
            .iter()
            .map(|key| {
                attributes
                    .iter()
                    .rev()
                    .find(|kv| kv.key == key.as_str())
                    .map(|kv| match &kv.value {
                        Value::Str(value) => Cow::Borrowed(&**value),
                        other => Cow::Owned(other.to_string()),
                    })
                    .unwrap_or(Cow::Borrowed(""))
            })
            .collect()
    }
}

impl Recorder for PrometheusRecorder {
    fn add_requests(&self, quantity: u64, attributes: &[KeyValue]) {
        let values = self.label_values(attributes);
        self.requests_total.with_label_values(values.as_slice()).inc_by(quantity);
    }

    fn observe_request_duration(&self, duration: Duration, attributes: &[KeyValue]) {
        let values = self.label_values(attributes);
        self.request_duration_seconds
            .with_label_values(values.as_slice())
            .observe(duration.as_secs_f64());
    }

    fn observe_request_size(&self, size_bytes: u64, attributes: &[KeyValue]) {
        let values = self.label_values(attributes);
        self.request_size_bytes
            .with_label_values(values.as_slice())
            .observe(size_bytes as f64);
    }

    fn observe_response_size(&self, size_bytes: u64, attributes: &[KeyValue]) {
        let values = self.label_values(attributes);
        self.response_size_bytes
            .with_label_values(values.as_slice())
            .observe(size_bytes as f64);
    }

    fn add_in_flight_requests(&self, delta: i64, attributes: &[KeyValue]) {
        let values = self.label_values(attributes);
        self.active_requests.with_label_values(values.as_slice()).add(delta);
    }
}

/// Builder for PrometheusRecorder
#[must_use = "builder does nothing until you call build()"]
pub struct PrometheusRecorderBuilder {
    namespace: String,
    label_keys: Vec<String>,
    duration_buckets: Vec<f64>,
    registry: Option<Registry>,
}

impl PrometheusRecorderBuilder {
    pub fn new() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            label_keys: vec![
                semconv::HTTP_METHOD.to_string(),
                semconv::HTTP_SERVER_NAME.to_string(),
                semconv::HTTP_ROUTE.to_string(),
                semconv::HTTP_STATUS_CODE.to_string(),
            ],
            duration_buckets: DEFAULT_DURATION_BUCKETS.to_vec(),
            registry: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Attribute keys exported as labels. Must cover the keys produced by a
    /// custom attributes function, plus `http.status_code`.
    pub fn label_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.label_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Histogram buckets of the request duration, in seconds
    pub fn duration_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.duration_buckets = buckets;
        self
    }

    /// Register into an existing registry instead of a fresh one
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<PrometheusRecorder> {
        if self.duration_buckets.is_empty() {
            return Err(MetricsError::InvalidConfig(
                "duration buckets must not be empty".to_string(),
            ));
        }
        if self.duration_buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MetricsError::InvalidConfig(
                "duration buckets must be strictly increasing".to_string(),
            ));
        }

        let registry = self.registry.unwrap_or_default();
        let labels: Vec<String> = self.label_keys.iter().map(|key| label_name(key)).collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        let size_buckets = prometheus::exponential_buckets(100.0, 10.0, 7)?;

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Total number of HTTP requests")
                .namespace(self.namespace.clone()),
            &labels,
        )?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("duration_seconds", "HTTP request duration in seconds")
                .namespace(self.namespace.clone())
                .buckets(self.duration_buckets),
            &labels,
        )?;

        let request_size_bytes = HistogramVec::new(
            HistogramOpts::new("request_size_bytes", "Approximate HTTP request size in bytes")
                .namespace(self.namespace.clone())
                .buckets(size_buckets.clone()),
            &labels,
        )?;

        let response_size_bytes = HistogramVec::new(
            HistogramOpts::new("response_size_bytes", "HTTP response body size in bytes")
                .namespace(self.namespace.clone())
                .buckets(size_buckets),
            &labels,
        )?;

        let active_requests = IntGaugeVec::new(
            Opts::new(
                "active_requests",
                "Number of HTTP requests currently being processed",
            )
            .namespace(self.namespace.clone()),
            &labels,
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        registry.register(Box::new(request_size_bytes.clone()))?;
        registry.register(Box::new(response_size_bytes.clone()))?;
        registry.register(Box::new(active_requests.clone()))?;

        debug!(
            namespace = %self.namespace,
            labels = ?labels,
            "Prometheus recorder initialized"
        );

        Ok(PrometheusRecorder {
            requests_total,
            request_duration_seconds,
            request_size_bytes,
            response_size_bytes,
            active_requests,
            label_keys: self.label_keys.into(),
            registry,
        })
    }
}

impl Default for PrometheusRecorderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Prometheus label name for an attribute key (`http.route` -> `http_route`)
fn label_name(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
