//! Path-based request dispatch for a reverse proxy.
//!
//! A list of upstream descriptors is compiled once into a [`Dispatcher`]:
//! static responses, directories on disk, and HTTP/HTTPS backends, each
//! mounted at an exact path or, with a trailing `/`, at a path prefix.

pub mod config;
pub mod dispatcher;
pub mod error_pages;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::{ProxyConfig, UpstreamConfig};
pub use dispatcher::{BuildError, Dispatcher};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
