//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check upstream identifiers are present, unique and header-safe
//! - Validate value ranges (status codes, path shape)
//! - Check each upstream names exactly one destination kind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - URI syntax and scheme are left to the dispatcher build, which owns them

use std::collections::HashSet;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::{ProxyConfig, UpstreamConfig};
use crate::upstream::static_response::is_valid_static_code;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("upstream id {id:?} cannot be sent in a response header")]
    InvalidId { id: String },

    #[error("upstream id {id:?} is used more than once")]
    DuplicateId { id: String },

    #[error("upstream {id:?}: path {path:?} must start with '/'")]
    RelativePath { id: String, path: String },

    #[error("upstream {id:?}: static code {code} is not a valid HTTP status")]
    InvalidStaticCode { id: String, code: u16 },

    #[error("upstream {id:?}: static upstreams must not set a uri")]
    StaticWithUri { id: String },

    #[error("upstream {id:?}: a uri is required unless static = true")]
    MissingUri { id: String },
}

/// Validate the whole configuration, collecting every problem.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, upstream) in config.upstreams.iter().enumerate() {
        if upstream.id.is_empty() {
            errors.push(ValidationError::EmptyId { index });
        } else if HeaderValue::from_str(&upstream.id).is_err() {
            errors.push(ValidationError::InvalidId { id: upstream.id.clone() });
        } else if !seen.insert(upstream.id.as_str()) {
            errors.push(ValidationError::DuplicateId { id: upstream.id.clone() });
        }
        validate_upstream(upstream, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream(upstream: &UpstreamConfig, errors: &mut Vec<ValidationError>) {
    let id = &upstream.id;

    if !upstream.path.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            id: id.clone(),
            path: upstream.path.clone(),
        });
    }

    if upstream.is_static {
        if let Some(code) = upstream.static_code {
            if !is_valid_static_code(code) {
                errors.push(ValidationError::InvalidStaticCode { id: id.clone(), code });
            }
        }
        if upstream.uri.is_some() {
            errors.push(ValidationError::StaticWithUri { id: id.clone() });
        }
    } else if upstream.uri.as_deref().map_or(true, str::is_empty) {
        errors.push(ValidationError::MissingUri { id: id.clone() });
    }
}
