use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use axum_test::TestServer;
use reqmeter_core::{semconv, KeyValue, MetricsConfig, MetricsOption, Recorder, Value};
use reqmeter_layer::{build_metrics_layer, MetricsLayer};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::{Layer, Service, ServiceExt};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Requests(u64, Vec<KeyValue>),
    Duration(Vec<KeyValue>),
    RequestSize(u64, Vec<KeyValue>),
    ResponseSize(u64, Vec<KeyValue>),
    InFlight(i64, Vec<KeyValue>),
}

/// 记录所有调用的测试recorder
#[derive(Default)]
struct CapturingRecorder {
    events: Mutex<Vec<Event>>,
}

impl CapturingRecorder {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Recorder for CapturingRecorder {
    fn add_requests(&self, quantity: u64, attributes: &[KeyValue]) {
        self.push(Event::Requests(quantity, attributes.to_vec()));
    }

    fn observe_request_duration(&self, _duration: Duration, attributes: &[KeyValue]) {
        self.push(Event::Duration(attributes.to_vec()));
    }

    fn observe_request_size(&self, size_bytes: u64, attributes: &[KeyValue]) {
        self.push(Event::RequestSize(size_bytes, attributes.to_vec()));
    }

    fn observe_response_size(&self, size_bytes: u64, attributes: &[KeyValue]) {
        self.push(Event::ResponseSize(size_bytes, attributes.to_vec()));
    }

    fn add_in_flight_requests(&self, delta: i64, attributes: &[KeyValue]) {
        self.push(Event::InFlight(delta, attributes.to_vec()));
    }
}

fn create_test_app(config: MetricsConfig) -> Router {
    Router::new()
        .route("/users/{id}", get(|| async { "hello" }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "gone") }))
        .route("/echo", post(|body: String| async move { body }))
        .layer(build_metrics_layer("api", config).unwrap())
}

fn create_test_server(options: Vec<MetricsOption>) -> (TestServer, Arc<CapturingRecorder>) {
    let recorder = Arc::new(CapturingRecorder::default());
    let config = MetricsConfig::builder()
        .options(options)
        .recorder(recorder.clone())
        .build();

    let server = TestServer::new(create_test_app(config)).unwrap();
    (server, recorder)
}

fn request_attrs(method: &'static str, route: &'static str) -> Vec<KeyValue> {
    vec![
        KeyValue::new(semconv::HTTP_METHOD, method),
        KeyValue::new(semconv::HTTP_SERVER_NAME, "api"),
        KeyValue::new(semconv::HTTP_ROUTE, route),
    ]
}

fn with_status(mut attrs: Vec<KeyValue>, status: i64) -> Vec<KeyValue> {
    attrs.push(KeyValue::new(semconv::HTTP_STATUS_CODE, status));
    attrs
}

#[tokio::test]
async fn test_records_all_metrics_by_default() {
    let (server, recorder) = create_test_server(vec![]);

    let response = server.get("/users/42").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "hello");

    let req_attrs = request_attrs("GET", "/users/{id}");
    let res_attrs = with_status(req_attrs.clone(), 200);
    let events = recorder.events();

    assert_eq!(events.len(), 6);
    assert_eq!(events[0], Event::InFlight(1, req_attrs.clone()));
    assert_eq!(events[1], Event::Requests(1, res_attrs.clone()));
    assert!(matches!(
        &events[2],
        Event::RequestSize(size, attrs) if *size > 0 && *attrs == res_attrs
    ));
    assert_eq!(events[3], Event::ResponseSize(5, res_attrs.clone()));
    assert_eq!(events[4], Event::Duration(res_attrs));
    // 请求结束后in-flight计数回落
    assert_eq!(events[5], Event::InFlight(-1, req_attrs));
}

#[tokio::test]
async fn test_grouped_status() {
    let (server, recorder) = create_test_server(vec![]);

    let response = server.get("/missing").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let expected = with_status(request_attrs("GET", "/missing"), 400);
    assert!(recorder
        .events()
        .contains(&Event::Requests(1, expected)));
}

#[tokio::test]
async fn test_exact_status_when_grouping_disabled() {
    let (server, recorder) =
        create_test_server(vec![MetricsOption::with_grouped_status_disabled()]);

    server.get("/missing").await;

    let expected = with_status(request_attrs("GET", "/missing"), 404);
    assert!(recorder
        .events()
        .contains(&Event::Requests(1, expected)));
}

#[tokio::test]
async fn test_disabled_metrics_are_not_recorded() {
    // 参数不影响结果：disable选项总是关闭对应指标
    let (server, recorder) = create_test_server(vec![
        MetricsOption::with_record_in_flight_disabled(true),
        MetricsOption::with_record_duration_disabled(false),
        MetricsOption::with_record_size_disabled(true),
    ]);

    server.get("/users/1").await;

    let events = recorder.events();
    assert_eq!(
        events,
        vec![Event::Requests(1, with_status(request_attrs("GET", "/users/{id}"), 200))]
    );
}

#[tokio::test]
async fn test_request_and_response_size() {
    let (server, recorder) = create_test_server(vec![
        MetricsOption::with_record_in_flight_disabled(true),
        MetricsOption::with_record_duration_disabled(true),
    ]);

    server.post("/echo").text("ping pong").await;

    let events = recorder.events();
    let request_size = events.iter().find_map(|event| match event {
        Event::RequestSize(size, _) => Some(*size),
        _ => None,
    });
    let response_size = events.iter().find_map(|event| match event {
        Event::ResponseSize(size, _) => Some(*size),
        _ => None,
    });

    assert!(request_size.unwrap() >= ("/echo".len() + "POST".len()) as u64);
    assert_eq!(response_size, Some(9));
}

#[tokio::test]
async fn test_custom_attributes() {
    let (server, recorder) = create_test_server(vec![
        MetricsOption::with_record_in_flight_disabled(true),
        MetricsOption::with_record_size_disabled(true),
        MetricsOption::with_record_duration_disabled(true),
        MetricsOption::with_attributes(|server_name, route, request| {
            vec![
                KeyValue::new("service", server_name.to_string()),
                KeyValue::new("endpoint", format!("{} {}", request.method(), route)),
            ]
        }),
    ]);

    server.get("/users/7").await;

    assert_eq!(
        recorder.events(),
        vec![Event::Requests(
            1,
            vec![
                KeyValue::new("service", "api"),
                KeyValue::new("endpoint", "GET /users/{id}"),
                KeyValue::new(semconv::HTTP_STATUS_CODE, 200_i64),
            ]
        )]
    );
}

#[tokio::test]
async fn test_unmatched_route() {
    let recorder = Arc::new(CapturingRecorder::default());
    let config = MetricsConfig::builder()
        .record_in_flight_disabled(true)
        .record_size_disabled(true)
        .record_duration_disabled(true)
        .recorder(recorder.clone())
        .build();

    let layer = MetricsLayer::new("", config).unwrap();
    let service = layer.layer(tower::service_fn(|_req: Request| async {
        Ok::<_, Infallible>(axum::response::Response::new(Body::empty()))
    }));

    let request = Request::builder().uri("/anything").body(Body::empty()).unwrap();
    let response = service.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    let Event::Requests(1, attrs) = &events[0] else {
        panic!("unexpected event: {:?}", events[0]);
    };
    // 空的server name不会出现在属性中
    assert_eq!(
        attrs,
        &vec![
            KeyValue::new(semconv::HTTP_METHOD, "GET"),
            KeyValue::new(semconv::HTTP_ROUTE, "nonconfigured"),
            KeyValue::new(semconv::HTTP_STATUS_CODE, 200_i64),
        ]
    );
    assert_eq!(attrs[2].value, Value::Int(200));
}

#[tokio::test]
async fn test_in_flight_released_on_error() {
    let recorder = Arc::new(CapturingRecorder::default());
    let config = MetricsConfig::builder().recorder(recorder.clone()).build();

    let layer = MetricsLayer::new("api", config).unwrap();
    let service = layer.layer(tower::service_fn(|_req: Request| async {
        Err::<axum::response::Response, _>("backend failed")
    }));

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let result = service.oneshot(request).await;
    assert!(result.is_err());

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Event::InFlight(1, _)));
    assert!(matches!(events[1], Event::InFlight(-1, _)));
}

#[tokio::test]
async fn test_in_flight_released_when_future_dropped() {
    let recorder = Arc::new(CapturingRecorder::default());
    let config = MetricsConfig::builder().recorder(recorder.clone()).build();

    let layer = MetricsLayer::new("api", config).unwrap();
    let mut service = layer.layer(tower::service_fn(|_req: Request| async {
        Ok::<_, Infallible>(axum::response::Response::new(Body::empty()))
    }));

    let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
    let future = service.ready().await.unwrap().call(request);
    assert_eq!(recorder.events().len(), 1);

    // 未被poll的请求被取消
    drop(future);

    let attrs = vec![
        KeyValue::new(semconv::HTTP_METHOD, "GET"),
        KeyValue::new(semconv::HTTP_SERVER_NAME, "api"),
        KeyValue::new(semconv::HTTP_ROUTE, "nonconfigured"),
    ];
    assert_eq!(
        recorder.events(),
        vec![Event::InFlight(1, attrs.clone()), Event::InFlight(-1, attrs)]
    );
}

#[cfg(feature = "observability")]
#[tokio::test]
async fn test_prometheus_exposition() {
    use reqmeter_layer::{metrics_routes, PrometheusRecorder};

    let prometheus = Arc::new(PrometheusRecorder::new().unwrap());
    let config = MetricsConfig::builder().recorder(prometheus.clone()).build();

    let app = create_test_app(config).merge(metrics_routes("/metrics", prometheus.clone()));
    let server = TestServer::new(app).unwrap();

    server.get("/users/3").await;
    server.get("/users/4").await;

    let response = server.get("/metrics").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body = response.text();
    assert!(body.contains("# TYPE http_server_requests_total counter"));
    assert!(body.contains("http_route=\"/users/{id}\""));
    assert!(body.contains("http_server_duration_seconds_bucket"));

    assert_eq!(
        prometheus
            .requests_total
            .with_label_values(&["GET", "api", "/users/{id}", "200"])
            .get(),
        2
    );
    // /metrics本身不经过中间件
    assert!(!body.contains("http_route=\"/metrics\""));
}
