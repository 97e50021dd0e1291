//! Upstream handlers.
//!
//! # Data Flow
//! ```text
//! UpstreamConfig
//!     → resolve() (static? else parse uri, switch on scheme)
//!     → UpstreamHandler::{Static, FileSystem, Proxy}
//!     → registered once, invoked for every matching request
//! ```
//!
//! # Design Decisions
//! - The handler kind is fixed at build time; no type inspection per request
//! - Any URI problem aborts the whole build, naming the upstream id
//! - Every response carries `GAP-Upstream-Address` with the upstream id, so
//!   an id that is not a valid header value fails the build

pub mod file_server;
pub mod http_proxy;
pub mod static_response;

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::response::Response;
use url::Url;

use crate::config::UpstreamConfig;
use crate::dispatcher::BuildError;
use crate::observability::Mapping;

pub use file_server::FileServer;
pub use http_proxy::{error_handler, HttpUpstreamProxy, ProxyErrorHandler, RequestSigner, UpstreamError};
pub use static_response::{is_valid_static_code, StaticResponseHandler, DEFAULT_STATIC_CODE};

/// Response header naming the upstream that produced a response.
pub const UPSTREAM_ADDRESS_HEADER: &str = "gap-upstream-address";

const FILE_SCHEME: &str = "file";
const HTTP_SCHEME: &str = "http";
const HTTPS_SCHEME: &str = "https";

/// Dependencies shared by every HTTP/HTTPS upstream of one build.
#[derive(Clone)]
pub struct Collaborators {
    pub signer: Option<Arc<dyn RequestSigner>>,
    pub error_handler: ProxyErrorHandler,
}

impl Collaborators {
    pub fn new(error_handler: ProxyErrorHandler) -> Self {
        Self {
            signer: None,
            error_handler,
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }
}

/// The concrete handler behind one route.
#[derive(Debug)]
pub enum UpstreamHandler {
    Static(StaticResponseHandler),
    FileSystem(FileServer),
    Proxy(HttpUpstreamProxy),
}

impl UpstreamHandler {
    /// Build the handler for `upstream`, plus the mapping it reports.
    pub fn resolve(
        upstream: &UpstreamConfig,
        collaborators: &Collaborators,
    ) -> Result<(Self, Mapping), BuildError> {
        let id = &upstream.id;
        if HeaderValue::from_str(id).is_err() {
            return Err(BuildError::InvalidId { id: id.clone() });
        }

        if upstream.is_static {
            let handler = StaticResponseHandler::new(id, upstream.static_code).ok_or_else(|| {
                BuildError::InvalidStaticCode {
                    id: id.clone(),
                    code: upstream.static_code.unwrap_or(DEFAULT_STATIC_CODE),
                }
            })?;
            let mapping = Mapping::Static {
                code: handler.code().as_u16(),
            };
            return Ok((UpstreamHandler::Static(handler), mapping));
        }

        let raw = upstream
            .uri
            .as_deref()
            .ok_or_else(|| BuildError::MissingUri { id: id.clone() })?;
        let uri = Url::parse(raw).map_err(|source| BuildError::InvalidUri {
            id: id.clone(),
            uri: raw.to_string(),
            source,
        })?;

        match uri.scheme() {
            FILE_SCHEME => {
                let root = uri
                    .to_file_path()
                    .unwrap_or_else(|()| PathBuf::from(uri.path()));
                let mapping = Mapping::FileSystem {
                    root: root.display().to_string(),
                };
                let handler = FileServer::new(id, &upstream.path, root);
                Ok((UpstreamHandler::FileSystem(handler), mapping))
            }
            HTTP_SCHEME | HTTPS_SCHEME => {
                let mapping = Mapping::Upstream {
                    uri: raw.to_string(),
                };
                let handler = HttpUpstreamProxy::new(
                    upstream,
                    uri,
                    collaborators.signer.clone(),
                    collaborators.error_handler.clone(),
                )
                .map_err(|source| BuildError::Client {
                    id: id.clone(),
                    source,
                })?;
                Ok((UpstreamHandler::Proxy(handler), mapping))
            }
            other => Err(BuildError::UnsupportedScheme {
                id: id.clone(),
                scheme: other.to_string(),
            }),
        }
    }

    /// Produce the complete response for `request`.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        match self {
            UpstreamHandler::Static(handler) => handler.respond(),
            UpstreamHandler::FileSystem(handler) => handler.serve(request).await,
            UpstreamHandler::Proxy(handler) => handler.serve(request).await,
        }
    }
}

/// Stamp the upstream id on an outgoing response.
fn tag_response(response: &mut Response, upstream: Option<&HeaderValue>) {
    if let Some(value) = upstream {
        response
            .headers_mut()
            .insert(UPSTREAM_ADDRESS_HEADER, value.clone());
    }
}
