use axum::extract::Request;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Whether the request declares itself an API request: a `.json` path,
/// or JSON in `Content-Type` or `Accept`.
pub fn is_api_request(path: &str, headers: &HeaderMap) -> bool {
    if path.ends_with(".json") {
        return true;
    }
    [header::CONTENT_TYPE, header::ACCEPT].iter().any(|name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"))
    })
}

/// Middleware rejecting anything that is not an API request with 406.
pub async fn require_api_format(request: Request, next: Next) -> Response {
    if is_api_request(request.uri().path(), request.headers()) {
        next.run(request).await
    } else {
        ApiError::not_acceptable().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn detects_api_requests() {
        let mut headers = HeaderMap::new();
        assert!(!is_api_request("/extended_api/queries", &headers));
        assert!(is_api_request("/extended_api/queries.json", &headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(is_api_request("/extended_api/queries", &headers));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(is_api_request("/extended_api/queries", &headers));

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!is_api_request("/extended_api/queries", &headers));
    }
}
