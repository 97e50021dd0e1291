//! Registration diagnostics.
//!
//! The dispatcher build reports every path-to-destination mapping through a
//! [`RegistrationObserver`] handed to it, never through a global logger, so
//! the build can be inspected in tests without capturing output.

use std::sync::Mutex;

/// Where a registered path leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
    /// Canned response with this status code.
    Static { code: u16 },
    /// Files served from this directory.
    FileSystem { root: String },
    /// Requests proxied to this backend URI.
    Upstream { uri: String },
}

impl std::fmt::Display for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mapping::Static { code } => write!(f, "static response {code}"),
            Mapping::FileSystem { root } => write!(f, "file system {root:?}"),
            Mapping::Upstream { uri } => write!(f, "upstream {uri:?}"),
        }
    }
}

/// Receives one call per route as the dispatcher is built.
pub trait RegistrationObserver: Send + Sync {
    fn mapped(&self, id: &str, path: &str, target: &Mapping);
}

/// Emits each mapping as an `info` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RegistrationObserver for TracingObserver {
    fn mapped(&self, id: &str, path: &str, target: &Mapping) {
        tracing::info!(upstream = %id, path = %path, "mapping path {path:?} => {target}");
    }
}

/// Keeps mappings in memory, in registration order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(String, Mapping)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(path, mapping)` pairs seen so far.
    pub fn events(&self) -> Vec<(String, Mapping)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl RegistrationObserver for RecordingObserver {
    fn mapped(&self, _id: &str, path: &str, target: &Mapping) {
        if let Ok(mut events) = self.events.lock() {
            events.push((path.to_string(), target.clone()));
        }
    }
}
