//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatcher.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Error page rendering for failed upstream connections.
    pub error_pages: ErrorPageConfig,

    /// Upstream descriptors, registered in order.
    pub upstreams: Vec<UpstreamConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// One routing rule: requests under `path` go to a static response, a
/// directory on disk, or an HTTP/HTTPS backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Unique identifier, used in diagnostics and the `GAP-Upstream-Address` header.
    pub id: String,

    /// Route key. A trailing `/` makes this a prefix route.
    pub path: String,

    /// Respond with `static_code` instead of contacting anything.
    #[serde(rename = "static", default)]
    pub is_static: bool,

    /// Status code for static upstreams (default: 200).
    #[serde(default)]
    pub static_code: Option<u16>,

    /// `file://`, `http://` or `https://` reference for non-static upstreams.
    #[serde(default)]
    pub uri: Option<String>,

    /// Forward the client's Host header instead of the upstream authority.
    #[serde(default = "default_pass_host_header")]
    pub pass_host_header: bool,

    /// Skip TLS certificate verification for this upstream only.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    /// Total timeout for one backend exchange, in seconds.
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,

    /// Accepted for compatibility; response bodies are always streamed unbuffered.
    #[serde(default)]
    pub flush_interval_ms: Option<u64>,
}

impl UpstreamConfig {
    /// Static upstream answering `code` at `path`.
    pub fn static_response(id: impl Into<String>, path: impl Into<String>, code: Option<u16>) -> Self {
        Self {
            is_static: true,
            static_code: code,
            ..Self::blank(id.into(), path.into())
        }
    }

    /// Upstream backed by a `file://` or `http(s)://` reference.
    pub fn with_uri(id: impl Into<String>, path: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::blank(id.into(), path.into())
        }
    }

    fn blank(id: String, path: String) -> Self {
        Self {
            id,
            path,
            is_static: false,
            static_code: None,
            uri: None,
            pass_host_header: default_pass_host_header(),
            insecure_skip_tls_verify: false,
            timeout_secs: default_upstream_timeout(),
            flush_interval_ms: None,
        }
    }
}

fn default_pass_host_header() -> bool {
    true
}

fn default_upstream_timeout() -> u64 {
    30
}

/// Timeout configuration for the serving side.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Error page configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorPageConfig {
    /// Footer line printed under every error page.
    pub footer: String,

    /// Include the underlying backend error in the page body.
    pub show_details: bool,
}

impl Default for ErrorPageConfig {
    fn default() -> Self {
        Self {
            footer: "upstream-dispatch".to_string(),
            show_details: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_defaults_from_toml() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [[upstreams]]
            id = "A"
            path = "/static"
            static = true
            static_code = 204

            [[upstreams]]
            id = "C"
            path = "/api/"
            uri = "http://backend:8080"
            pass_host_header = false
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.upstreams.len(), 2);

        let a = &config.upstreams[0];
        assert!(a.is_static);
        assert_eq!(a.static_code, Some(204));
        assert!(a.uri.is_none());

        let c = &config.upstreams[1];
        assert!(!c.is_static);
        assert!(!c.pass_host_header);
        assert_eq!(c.timeout_secs, 30);
        assert_eq!(c.uri.as_deref(), Some("http://backend:8080"));
    }
}
