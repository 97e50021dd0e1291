//! The composed request handler.
//!
//! # Responsibilities
//! - Turn the configured upstream list into one route table, all or nothing
//! - Report each mapping through the injected observer
//! - Serve every request from the route table, or answer 404
//!
//! # Design Decisions
//! - Built once, single-threaded, then only read; shared via Arc without locks
//! - A build error drops everything built so far, so no partial dispatcher exists
//! - No per-request state; the matched handler alone produces the response

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::observability::RegistrationObserver;
use crate::routing::{MatchMode, Route, Router};
use crate::upstream::{Collaborators, UpstreamHandler};

/// Why the dispatcher could not be built.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("error parsing URI {uri:?} for upstream {id:?}: {source}")]
    InvalidUri {
        id: String,
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unknown scheme for upstream {id:?}: {scheme:?}")]
    UnsupportedScheme { id: String, scheme: String },

    #[error("upstream id {id:?} is not a valid header value")]
    InvalidId { id: String },

    #[error("upstream {id:?} has no URI and is not static")]
    MissingUri { id: String },

    #[error("upstream {id:?} has invalid static code {code}")]
    InvalidStaticCode { id: String, code: u16 },

    #[error("upstream {id:?} registers path {path:?}, already registered by upstream {existing:?}")]
    DuplicatePath {
        id: String,
        path: String,
        existing: String,
    },

    #[error("failed to create HTTP client for upstream {id:?}: {source}")]
    Client {
        id: String,
        #[source]
        source: reqwest::Error,
    },
}

impl BuildError {
    /// Identifier of the upstream that caused the failure.
    pub fn upstream_id(&self) -> &str {
        match self {
            BuildError::InvalidUri { id, .. }
            | BuildError::UnsupportedScheme { id, .. }
            | BuildError::InvalidId { id }
            | BuildError::MissingUri { id }
            | BuildError::InvalidStaticCode { id, .. }
            | BuildError::DuplicatePath { id, .. }
            | BuildError::Client { id, .. } => id,
        }
    }
}

/// Routes every request to the handler registered for its path.
#[derive(Debug)]
pub struct Dispatcher {
    routes: Router<UpstreamHandler>,
}

impl Dispatcher {
    /// Resolve and register every upstream, in order.
    pub fn build(
        upstreams: &[UpstreamConfig],
        collaborators: &Collaborators,
        observer: &dyn RegistrationObserver,
    ) -> Result<Self, BuildError> {
        let mut routes = Router::new();

        for upstream in upstreams {
            let (handler, mapping) = UpstreamHandler::resolve(upstream, collaborators)?;
            routes
                .register(upstream.id.as_str(), upstream.path.as_str(), handler)
                .map_err(|conflict| BuildError::DuplicatePath {
                    id: upstream.id.clone(),
                    path: conflict.path,
                    existing: conflict.existing,
                })?;
            observer.mapped(&upstream.id, &upstream.path, &mapping);
        }

        Ok(Self { routes })
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The route a request for `path` would be sent to.
    pub fn route_for(&self, path: &str) -> Option<&Route<UpstreamHandler>> {
        self.routes.match_path(path)
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        let Some(route) = self.routes.match_path(request.uri().path()) else {
            tracing::debug!(path = %request.uri().path(), "No route matched");
            return not_found();
        };

        tracing::debug!(
            upstream = %route.id,
            pattern = %route.pattern,
            prefix = route.mode == MatchMode::PrefixOfPath,
            "Dispatching request"
        );
        route.handler.handle(request).await
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found\n").into_response()
}
