//! Response builders and CORS handling.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;

pub type HttpResponse = Response<Full<Bytes>>;

/// JSON body with the given status.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => with_body(status, "application/json", body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Response serialization failed")
        }
    }
}

/// `{"detail": message}` error body.
pub fn error(status: StatusCode, detail: impl Into<String>) -> HttpResponse {
    let body = serde_json::json!({ "detail": detail.into() }).to_string();
    with_body(status, "application/json", body.into_bytes())
}

pub fn empty(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn with_body(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Credentialed CORS for a fixed list of browser origins.
#[derive(Debug, Clone)]
pub struct Cors {
    allowed_origins: Vec<String>,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    fn allows(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }

    /// Echo an allowed `Origin` back with the CORS headers. Unknown origins
    /// get no CORS headers at all.
    pub fn apply(&self, origin: Option<&str>, response: &mut HttpResponse) {
        let headers = response.headers_mut();
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));

        let Some(origin) = origin.filter(|o| self.allows(o)) else {
            return;
        };
        let Ok(origin) = HeaderValue::from_str(origin) else {
            return;
        };
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let response = error(StatusCode::BAD_REQUEST, "File is empty");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[test]
    fn test_cors_echoes_allowed_origin() {
        let cors = Cors::new(vec!["http://localhost:5173".to_string()]);
        let mut response = empty(StatusCode::NO_CONTENT);
        cors.apply(Some("http://localhost:5173"), &mut response);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[test]
    fn test_cors_ignores_unknown_origin() {
        let cors = Cors::new(vec!["http://localhost:5173".to_string()]);
        let mut response = empty(StatusCode::OK);
        cors.apply(Some("https://evil.example"), &mut response);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());

        cors.apply(None, &mut response);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_cors_wildcard() {
        let cors = Cors::new(vec!["*".to_string()]);
        let mut response = empty(StatusCode::OK);
        cors.apply(Some("https://anywhere.example"), &mut response);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://anywhere.example"
        );
    }
}
