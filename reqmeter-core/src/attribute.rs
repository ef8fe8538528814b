use axum::extract::Request;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Attribute keys following the OpenTelemetry HTTP semantic conventions
pub mod semconv {
    pub const HTTP_METHOD: &str = "http.method";
    pub const HTTP_SERVER_NAME: &str = "http.server_name";
    pub const HTTP_ROUTE: &str = "http.route";
    pub const HTTP_STATUS_CODE: &str = "http.status_code";
}

/// 属性值
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Str(Cow<'static, str>),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Cow::Owned(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// A single key/value pair attached to every metric recorded for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyValue {
    pub key: Cow<'static, str>,
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Computes the attributes of a request from the server name, the matched
/// route pattern and the request itself.
///
/// The function is called once per request on the hot path and should be
/// free of side effects.
pub type AttributesFn = Arc<dyn Fn(&str, &str, &Request) -> Vec<KeyValue> + Send + Sync>;

/// Default attribute set: the request method, plus the server name and route
/// when they are non-empty.
pub fn default_attributes(server_name: &str, route: &str, request: &Request) -> Vec<KeyValue> {
    let mut attrs = vec![KeyValue::new(
        semconv::HTTP_METHOD,
        request.method().as_str().to_string(),
    )];

    if !server_name.is_empty() {
        attrs.push(KeyValue::new(
            semconv::HTTP_SERVER_NAME,
            server_name.to_string(),
        ));
    }

    if !route.is_empty() {
        attrs.push(KeyValue::new(semconv::HTTP_ROUTE, route.to_string()));
    }

    attrs
}
