use super::size::{approximate_request_size, response_size};
use crate::error::Result;
use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::response::Response;
use futures::future::BoxFuture;
use reqmeter_core::{semconv, KeyValue, MetricsConfig, Recorder};
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::debug;

/// Route reported for requests that did not match any route
pub const UNMATCHED_ROUTE: &str = "nonconfigured";

/// Build a Tower layer recording HTTP metrics for `server_name`
pub fn build_metrics_layer(
    server_name: impl Into<String>,
    config: MetricsConfig,
) -> Result<MetricsLayer> {
    MetricsLayer::new(server_name, config)
}

/// Tower layer recording HTTP request metrics
///
/// When the configuration carries no recorder the process-wide Prometheus
/// recorder is used (a no-op recorder without the `observability` feature).
#[derive(Clone)]
pub struct MetricsLayer {
    server_name: Arc<str>,
    config: Arc<MetricsConfig>,
    recorder: Arc<dyn Recorder>,
}

impl MetricsLayer {
    pub fn new(server_name: impl Into<String>, config: MetricsConfig) -> Result<Self> {
        let recorder = match config.recorder() {
            Some(recorder) => recorder.clone(),
            None => default_recorder()?,
        };
        let server_name: Arc<str> = Arc::from(server_name.into());

        debug!(
            server_name = %server_name,
            record_in_flight = config.record_in_flight(),
            record_duration = config.record_duration(),
            record_size = config.record_size(),
            grouped_status = config.grouped_status(),
            "Metrics layer initialized"
        );

        Ok(Self {
            server_name,
            config: Arc::new(config),
            recorder,
        })
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// The recorder receiving every observation of this layer
    pub fn recorder(&self) -> &Arc<dyn Recorder> {
        &self.recorder
    }
}

impl fmt::Debug for MetricsLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsLayer")
            .field("server_name", &self.server_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            server_name: self.server_name.clone(),
            config: self.config.clone(),
            recorder: self.recorder.clone(),
        }
    }
}

#[cfg(feature = "observability")]
fn default_recorder() -> Result<Arc<dyn Recorder>> {
    let recorder = crate::observability::PrometheusRecorder::global()?;
    Ok(recorder)
}

#[cfg(not(feature = "observability"))]
fn default_recorder() -> Result<Arc<dyn Recorder>> {
    tracing::warn!(
        "No recorder configured and observability feature disabled, metrics are discarded"
    );
    Ok(Arc::new(reqmeter_core::NoopRecorder))
}

/// Tower service recording HTTP request metrics
#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    server_name: Arc<str>,
    config: Arc<MetricsConfig>,
    recorder: Arc<dyn Recorder>,
}

impl<S> Service<Request> for MetricsService<S>
where
    S: Service<Request, Response = Response>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let start = Instant::now();
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|path| path.as_str().to_owned())
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

        let attributes = self.config.attributes(&self.server_name, &route, &req);

        let in_flight = self
            .config
            .record_in_flight()
            .then(|| InFlightGuard::new(self.recorder.clone(), attributes.clone()));

        // 请求体交给内部服务前先计算大小
        let request_size = self
            .config
            .record_size()
            .then(|| approximate_request_size(&req));

        let config = self.config.clone();
        let recorder = self.recorder.clone();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let _in_flight = in_flight;
            let response = fut.await?;

            let mut attributes = attributes;
            attributes.push(status_attribute(response.status(), config.grouped_status()));

            recorder.add_requests(1, &attributes);

            if let Some(request_size) = request_size {
                recorder.observe_request_size(request_size, &attributes);
                recorder.observe_response_size(response_size(&response), &attributes);
            }

            if config.record_duration() {
                recorder.observe_request_duration(start.elapsed(), &attributes);
            }

            Ok(response)
        })
    }
}

/// `http.status_code` attribute: the status class (200, 300, ...) when
/// grouped, the exact code otherwise.
pub fn status_attribute(status: StatusCode, grouped: bool) -> KeyValue {
    let code = status.as_u16();
    let code = if grouped { code / 100 * 100 } else { code };
    KeyValue::new(semconv::HTTP_STATUS_CODE, i64::from(code))
}

/// Decrements the in-flight count when the request completes or is dropped.
struct InFlightGuard {
    recorder: Arc<dyn Recorder>,
    attributes: Vec<KeyValue>,
}

impl InFlightGuard {
    fn new(recorder: Arc<dyn Recorder>, attributes: Vec<KeyValue>) -> Self {
        recorder.add_in_flight_requests(1, &attributes);
        Self {
            recorder,
            attributes,
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.recorder.add_in_flight_requests(-1, &self.attributes);
    }
}
