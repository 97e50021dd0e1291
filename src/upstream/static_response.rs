//! Canned responses.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;

use super::tag_response;

/// Status used when a static upstream does not set one.
pub const DEFAULT_STATIC_CODE: u16 = 200;

const STATIC_BODY: &str = "Authenticated";

/// Whether `code` may be configured on a static upstream.
pub fn is_valid_static_code(code: u16) -> bool {
    (100..=599).contains(&code)
}

/// Answers every request with the same status and no backend involved.
#[derive(Debug, Clone)]
pub struct StaticResponseHandler {
    upstream: Option<HeaderValue>,
    code: StatusCode,
}

impl StaticResponseHandler {
    /// `None` if `code` is not a usable HTTP status.
    pub fn new(id: &str, code: Option<u16>) -> Option<Self> {
        let code = code.unwrap_or(DEFAULT_STATIC_CODE);
        if !is_valid_static_code(code) {
            return None;
        }
        let code = StatusCode::from_u16(code).ok()?;
        Some(Self {
            upstream: HeaderValue::from_str(id).ok(),
            code,
        })
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn respond(&self) -> Response {
        let body = if allows_body(self.code) {
            Body::from(STATIC_BODY)
        } else {
            Body::empty()
        };
        let mut response = Response::new(body);
        *response.status_mut() = self.code;
        tag_response(&mut response, self.upstream.as_ref());
        response
    }
}

fn allows_body(code: StatusCode) -> bool {
    !(code.is_informational() || code == StatusCode::NO_CONTENT || code == StatusCode::NOT_MODIFIED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UPSTREAM_ADDRESS_HEADER;

    #[tokio::test]
    async fn test_defaults_to_ok_with_body() {
        let handler = StaticResponseHandler::new("auth", None).unwrap();
        let response = handler.respond();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[UPSTREAM_ADDRESS_HEADER], "auth");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Authenticated");
    }

    #[tokio::test]
    async fn test_no_content_has_empty_body() {
        let handler = StaticResponseHandler::new("A", Some(204)).unwrap();
        let response = handler.respond();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_rejects_impossible_code() {
        assert!(StaticResponseHandler::new("A", Some(42)).is_none());
        assert!(StaticResponseHandler::new("A", Some(600)).is_none());
        assert!(StaticResponseHandler::new("A", Some(700)).is_none());
        assert!(StaticResponseHandler::new("A", Some(1000)).is_none());
        assert!(StaticResponseHandler::new("A", Some(599)).is_some());
    }
}
