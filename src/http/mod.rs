//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → Dispatcher (route lookup, handler)
//!     → headers.rs (hop-by-hop stripping, forwarding headers) for proxied routes
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{build_dispatcher, DispatcherHandle, HttpServer};
