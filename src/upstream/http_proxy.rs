//! Forwarding to HTTP/HTTPS backends.
//!
//! # Responsibilities
//! - Rewrite the request URL onto the backend (single-slash path join, merged query)
//! - Strip hop-by-hop headers, add forwarding headers, optionally sign
//! - Stream request and response bodies without buffering
//! - Hand connection failures to the injected error handler
//!
//! # Design Decisions
//! - One `reqwest::Client` per upstream so timeout and TLS policy stay local
//! - Redirects are returned to the client, never followed here
//! - Every transport failure maps to the error handler, which owns the page
//! - A request without `Accept` reaches the backend with `Accept: */*`;
//!   reqwest always adds it and offers no way to turn it off

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Uri};
use axum::response::Response;
use thiserror::Error;
use url::Url;

use super::tag_response;
use crate::config::UpstreamConfig;
use crate::http::headers::{set_forwarded, strip_hop_by_hop};

/// Renders the response for a request whose backend exchange failed.
pub type ProxyErrorHandler = Arc<dyn Fn(&Parts, &UpstreamError) -> Response + Send + Sync>;

/// Wrap a closure as a [`ProxyErrorHandler`].
pub fn error_handler<F>(f: F) -> ProxyErrorHandler
where
    F: Fn(&Parts, &UpstreamError) -> Response + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Adds authentication data to requests leaving for a backend.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, method: &Method, url: &Url, headers: &mut HeaderMap);
}

/// A failed backend exchange.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream {id:?} request failed: {source}")]
    Transport {
        id: String,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        match self {
            UpstreamError::Transport { source, .. } => source.is_timeout(),
        }
    }
}

pub struct HttpUpstreamProxy {
    id: String,
    upstream: Option<HeaderValue>,
    target: Url,
    pass_host_header: bool,
    client: reqwest::Client,
    signer: Option<Arc<dyn RequestSigner>>,
    error_handler: ProxyErrorHandler,
}

impl std::fmt::Debug for HttpUpstreamProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpUpstreamProxy")
            .field("id", &self.id)
            .field("target", &self.target.as_str())
            .field("pass_host_header", &self.pass_host_header)
            .field("signed", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpUpstreamProxy {
    pub fn new(
        upstream: &UpstreamConfig,
        target: Url,
        signer: Option<Arc<dyn RequestSigner>>,
        error_handler: ProxyErrorHandler,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(upstream.insecure_skip_tls_verify);
        if upstream.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(upstream.timeout_secs));
        }

        Ok(Self {
            id: upstream.id.clone(),
            upstream: HeaderValue::from_str(&upstream.id).ok(),
            target,
            pass_host_header: upstream.pass_host_header,
            client: builder.build()?,
            signer,
            error_handler,
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Backend URL for an incoming request URI.
    pub fn target_url(&self, uri: &Uri) -> Url {
        let mut url = self.target.clone();
        url.set_path(&join_paths(self.target.path(), uri.path()));

        let query = match (self.target.query(), uri.query()) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Some(format!("{a}&{b}")),
            (Some(a), _) if !a.is_empty() => Some(a.to_string()),
            (_, Some(b)) if !b.is_empty() => Some(b.to_string()),
            _ => None,
        };
        url.set_query(query.as_deref());
        url
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let (parts, body) = request.into_parts();

        let url = self.target_url(&parts.uri);
        let headers = self.outbound_headers(&parts, client_ip, &url);

        let mut outbound = reqwest::Request::new(parts.method.clone(), url);
        *outbound.headers_mut() = headers;
        if !body.is_end_stream() {
            *outbound.body_mut() = Some(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        match self.client.execute(outbound).await {
            Ok(upstream_response) => {
                tracing::debug!(
                    upstream = %self.id,
                    status = %upstream_response.status(),
                    "Upstream responded"
                );
                self.relay_response(upstream_response)
            }
            Err(source) => {
                let error = UpstreamError::Transport {
                    id: self.id.clone(),
                    source,
                };
                tracing::error!(
                    upstream = %self.id,
                    path = %parts.uri.path(),
                    timeout = error.is_timeout(),
                    error = %error,
                    "Error proxying to upstream server"
                );
                let mut response = (self.error_handler)(&parts, &error);
                tag_response(&mut response, self.upstream.as_ref());
                response
            }
        }
    }

    fn outbound_headers(&self, parts: &Parts, client_ip: Option<IpAddr>, url: &Url) -> HeaderMap {
        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);

        let original_host = parts.headers.get(header::HOST).cloned().or_else(|| {
            parts
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        });
        let proto = match parts.uri.scheme_str() {
            Some("https") => "https",
            _ => "http",
        };
        set_forwarded(&mut headers, client_ip, original_host.as_ref(), proto);

        match original_host {
            Some(host) if self.pass_host_header => {
                headers.insert(header::HOST, host);
            }
            // reqwest fills in the backend authority.
            _ => {
                headers.remove(header::HOST);
            }
        }

        if let Some(signer) = &self.signer {
            signer.sign(&parts.method, url, &mut headers);
        }
        headers
    }

    fn relay_response(&self, upstream_response: reqwest::Response) -> Response {
        let status = upstream_response.status();
        let mut headers = upstream_response.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream_response.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        tag_response(&mut response, self.upstream.as_ref());
        response
    }
}

/// Join two URL paths with exactly one `/` between them.
fn join_paths(base: &str, request: &str) -> String {
    match (base.ends_with('/'), request.starts_with('/')) {
        (true, true) => format!("{base}{}", &request[1..]),
        (false, false) => format!("{base}/{request}"),
        _ => format!("{base}{request}"),
    }
}
