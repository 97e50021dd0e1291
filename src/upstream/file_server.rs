//! Directory-backed routes.
//!
//! The registered route path is removed from the request path before the
//! lookup, so `/files/` rooted at `/var/www` serves `/files/a.css` from
//! `/var/www/a.css`. Traversal outside the root is refused by `ServeDir`.

use std::convert::Infallible;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use super::tag_response;

#[derive(Debug, Clone)]
pub struct FileServer {
    upstream: Option<HeaderValue>,
    route_path: String,
    root: PathBuf,
    serve_dir: ServeDir,
}

impl FileServer {
    pub fn new(id: &str, route_path: &str, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            upstream: HeaderValue::from_str(id).ok(),
            route_path: route_path.to_string(),
            serve_dir: ServeDir::new(&root),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();

        parts.uri = match self.strip_route(&parts.uri) {
            Some(uri) => uri,
            None => return StatusCode::BAD_REQUEST.into_response(),
        };

        let result: Result<_, Infallible> = self
            .serve_dir
            .clone()
            .oneshot(Request::from_parts(parts, body))
            .await;
        let mut response = match result {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        };

        self.restore_redirect(&mut response);
        tag_response(&mut response, self.upstream.as_ref());
        response
    }

    fn strip_route(&self, uri: &Uri) -> Option<Uri> {
        let path = uri.path();
        let rest = path.strip_prefix(self.route_path.as_str()).unwrap_or(path);
        let rest = if rest.starts_with('/') {
            rest.to_string()
        } else {
            format!("/{rest}")
        };
        let path_and_query = match uri.query() {
            Some(query) => format!("{rest}?{query}"),
            None => rest,
        };
        path_and_query.parse().ok()
    }

    /// `ServeDir` redirects `dir` to `dir/` using the stripped path; put the
    /// route back in front so the client lands under the same route.
    fn restore_redirect(&self, response: &mut Response) {
        if !response.status().is_redirection() {
            return;
        }
        let base = self.route_path.trim_end_matches('/');
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|location| location.starts_with('/'))
            .map(|location| format!("{base}{location}"));

        if let Some(value) = location.and_then(|l| HeaderValue::from_str(&l).ok()) {
            response.headers_mut().insert(header::LOCATION, value);
        }
    }
}
