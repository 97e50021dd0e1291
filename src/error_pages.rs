//! HTML error pages for failed upstream exchanges.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use maud::{html, DOCTYPE};

use crate::config::ErrorPageConfig;
use crate::http::request::request_id;
use crate::upstream::{error_handler, ProxyErrorHandler};

const PROXY_ERROR_MESSAGE: &str = "There was a problem connecting to the upstream server.";

/// Renders the pages shown when a backend cannot be reached.
#[derive(Debug, Clone)]
pub struct ErrorPageWriter {
    footer: String,
    show_details: bool,
}

impl ErrorPageWriter {
    pub fn new(config: &ErrorPageConfig) -> Self {
        Self {
            footer: config.footer.clone(),
            show_details: config.show_details,
        }
    }

    /// Render a complete error page.
    pub fn render(
        &self,
        status: StatusCode,
        request_id: Option<&str>,
        message: &str,
        details: Option<&str>,
    ) -> Response {
        let title = format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error")
        );
        let details = details.filter(|_| self.show_details);

        let markup = html! {
            (DOCTYPE)
            html {
                head { title { (title) } }
                body {
                    h1 { (title) }
                    p { (message) }
                    @if let Some(details) = details {
                        pre { (details) }
                    }
                    @if let Some(id) = request_id {
                        p { "Request ID: " code { (id) } }
                    }
                    hr;
                    center { (self.footer) }
                }
            }
        };

        let mut response = (status, Html(markup.into_string())).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }

    /// Error handler for HTTP/HTTPS upstreams: a 502 page per failure.
    pub fn proxy_error_handler(&self) -> ProxyErrorHandler {
        let writer = self.clone();
        error_handler(move |parts, error| {
            let details = error.to_string();
            writer.render(
                StatusCode::BAD_GATEWAY,
                request_id(&parts.headers),
                PROXY_ERROR_MESSAGE,
                Some(&details),
            )
        })
    }
}

impl Default for ErrorPageWriter {
    fn default() -> Self {
        Self::new(&ErrorPageConfig::default())
    }
}
