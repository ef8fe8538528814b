use crate::attribute::KeyValue;
use std::time::Duration;

/// Backend that turns request observations into metrics.
///
/// The middleware calls a recorder from every request it instruments, so
/// implementations must be cheap and must not block.
pub trait Recorder: Send + Sync {
    /// Count finished requests.
    fn add_requests(&self, quantity: u64, attributes: &[KeyValue]);

    /// Observe the time taken to produce a response.
    fn observe_request_duration(&self, duration: Duration, attributes: &[KeyValue]);

    /// Observe the approximate size of a request in bytes.
    fn observe_request_size(&self, size_bytes: u64, attributes: &[KeyValue]);

    /// Observe the size of a response body in bytes.
    fn observe_response_size(&self, size_bytes: u64, attributes: &[KeyValue]);

    /// Adjust the number of requests currently being served.
    fn add_in_flight_requests(&self, delta: i64, attributes: &[KeyValue]);
}

/// 空实现，丢弃所有指标
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl Recorder for NoopRecorder {
    fn add_requests(&self, _quantity: u64, _attributes: &[KeyValue]) {}

    fn observe_request_duration(&self, _duration: Duration, _attributes: &[KeyValue]) {}

    fn observe_request_size(&self, _size_bytes: u64, _attributes: &[KeyValue]) {}

    fn observe_response_size(&self, _size_bytes: u64, _attributes: &[KeyValue]) {}

    fn add_in_flight_requests(&self, _delta: i64, _attributes: &[KeyValue]) {}
}
