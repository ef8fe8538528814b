use axum::body::HttpBody;
use axum::extract::Request;
use axum::http::{header, HeaderMap, Version};
use axum::response::Response;

/// Approximate size of a request in bytes.
///
/// Counts the path, method, protocol version, every header name and value,
/// the URI host when no `Host` header carries it, and the declared
/// `Content-Length`. The body itself is never read.
pub fn approximate_request_size(request: &Request) -> u64 {
    let mut size = request.uri().path().len();
    size += request.method().as_str().len();
    size += version_str(request.version()).len();

    for (name, value) in request.headers() {
        size += name.as_str().len();
        size += value.as_bytes().len();
    }

    if !request.headers().contains_key(header::HOST) {
        size += request.uri().host().map_or(0, str::len);
    }

    size as u64 + content_length(request.headers()).unwrap_or(0)
}

/// Size of a response body in bytes: the `Content-Length` header, or the
/// exact size hint of the body, or 0 for streaming bodies.
pub fn response_size(response: &Response) -> u64 {
    content_length(response.headers())
        .or_else(|| response.body().size_hint().exact())
        .unwrap_or(0)
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "",
    }
}
