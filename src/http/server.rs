//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the dispatcher as its only handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Swap in a rebuilt dispatcher when the configuration changes
//!
//! # Design Decisions
//! - The dispatcher is the fallback, so every method and path reaches it
//! - A reload builds a complete new dispatcher first; on error the old one stays
//! - In-flight requests keep the dispatcher they started with

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::dispatcher::{BuildError, Dispatcher};
use crate::error_pages::ErrorPageWriter;
use crate::http::request::UuidRequestId;
use crate::observability::{RegistrationObserver, TracingObserver};
use crate::upstream::{Collaborators, RequestSigner};

/// Build a dispatcher for `config`, with error pages rendered per its settings.
pub fn build_dispatcher(
    config: &ProxyConfig,
    signer: Option<Arc<dyn RequestSigner>>,
    observer: &dyn RegistrationObserver,
) -> Result<Dispatcher, BuildError> {
    let writer = ErrorPageWriter::new(&config.error_pages);
    let collaborators = Collaborators {
        signer,
        error_handler: writer.proxy_error_handler(),
    };
    Dispatcher::build(&config.upstreams, &collaborators, observer)
}

/// Shared, replaceable reference to the active dispatcher.
#[derive(Clone)]
pub struct DispatcherHandle {
    current: Arc<ArcSwap<Dispatcher>>,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl DispatcherHandle {
    pub fn new(dispatcher: Dispatcher, signer: Option<Arc<dyn RequestSigner>>) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(dispatcher)),
            signer,
        }
    }

    /// The dispatcher new requests are served by.
    pub fn current(&self) -> Arc<Dispatcher> {
        self.current.load_full()
    }

    /// Rebuild from `config` and make the result current.
    pub fn reload(&self, config: &ProxyConfig) -> Result<usize, BuildError> {
        let dispatcher = build_dispatcher(config, self.signer.clone(), &TracingObserver)?;
        let routes = dispatcher.len();
        self.current.store(Arc::new(dispatcher));
        Ok(routes)
    }
}

/// HTTP server for the dispatcher.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    handle: DispatcherHandle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, BuildError> {
        Self::with_signer(config, None)
    }

    /// Like [`HttpServer::new`], signing every proxied request with `signer`.
    pub fn with_signer(
        config: ProxyConfig,
        signer: Option<Arc<dyn RequestSigner>>,
    ) -> Result<Self, BuildError> {
        let dispatcher = build_dispatcher(&config, signer.clone(), &TracingObserver)?;
        let handle = DispatcherHandle::new(dispatcher, signer);
        let router = Self::build_router(&config, handle.clone());
        Ok(Self {
            router,
            config,
            handle,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, handle: DispatcherHandle) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(handle)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn handle(&self) -> &DispatcherHandle {
        &self.handle
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, applying configuration
    /// revisions from `config_updates` as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.handle.current().len(),
            "HTTP server starting"
        );

        let handle = self.handle.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match handle.reload(&config) {
                    Ok(routes) => tracing::info!(routes, "Dispatcher reloaded"),
                    Err(e) => tracing::error!(
                        upstream = %e.upstream_id(),
                        error = %e,
                        "Reload rejected, keeping current dispatcher"
                    ),
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Every request lands here.
async fn dispatch(State(handle): State<DispatcherHandle>, request: Request<Body>) -> Response {
    let dispatcher = handle.current();
    dispatcher.serve(request).await
}
