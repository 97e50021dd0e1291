//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Dispatcher::build → registration.rs (one event per mapped path)
//!
//! Per request:
//!     tower-http TraceLayer → request span with x-request-id
//!     handlers → structured events (upstream id, status, error)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, never string-only messages
//! - Request ID flows from the edge to proxied backends
//! - Build diagnostics go through an injected observer, not a global

pub mod logging;
pub mod registration;

pub use logging::init_logging;
pub use registration::{Mapping, RecordingObserver, RegistrationObserver, TracingObserver};
