//! Route registration and lookup.
//!
//! # Responsibilities
//! - Classify each registered path as Exact or PrefixOfPath
//! - Store compiled routes
//! - Look up the single best route for a request path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) exact lookup via HashMap, checked before any prefix
//! - Prefix lookup walks a segment trie; longest prefix wins
//! - Registering a path twice is a conflict, never an overwrite
//! - Explicit NoMatch (`None`) rather than silent default

use std::collections::HashMap;

use thiserror::Error;

use crate::routing::matcher::PrefixTrie;

/// How a registered path is compared with request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Only the identical path matches.
    Exact,
    /// Any path starting with the pattern (separator included) matches.
    PrefixOfPath,
}

impl MatchMode {
    /// Trailing `/` means prefix.
    pub fn for_path(path: &str) -> Self {
        if path.ends_with('/') {
            MatchMode::PrefixOfPath
        } else {
            MatchMode::Exact
        }
    }
}

/// A registered route and the handler it owns.
#[derive(Debug)]
pub struct Route<H> {
    /// Upstream identifier the route was built from.
    pub id: String,
    pub pattern: String,
    pub mode: MatchMode,
    pub handler: H,
}

/// A second registration for an already registered path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path {path:?} is already registered by upstream {existing:?}")]
pub struct RouteConflict {
    pub path: String,
    /// Id of the route that holds the path.
    pub existing: String,
}

/// Registry of exact and prefix routes.
#[derive(Debug)]
pub struct Router<H> {
    exact: HashMap<String, Route<H>>,
    prefixes: PrefixTrie<Route<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            prefixes: PrefixTrie::new(),
        }
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `path` on behalf of upstream `id`.
    ///
    /// On conflict the registry is left unchanged.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        path: impl Into<String>,
        handler: H,
    ) -> Result<MatchMode, RouteConflict> {
        let path = path.into();
        let mode = MatchMode::for_path(&path);

        if let Some(existing) = self.lookup_pattern(&path, mode) {
            return Err(RouteConflict {
                path,
                existing: existing.id.clone(),
            });
        }

        let route = Route {
            id: id.into(),
            pattern: path.clone(),
            mode,
            handler,
        };
        match mode {
            MatchMode::Exact => {
                self.exact.insert(path, route);
            }
            MatchMode::PrefixOfPath => {
                self.prefixes.insert(&path, route);
            }
        }
        Ok(mode)
    }

    /// Best route for `path`: an exact route if one exists, otherwise the
    /// longest matching prefix route.
    pub fn match_path(&self, path: &str) -> Option<&Route<H>> {
        self.exact
            .get(path)
            .or_else(|| self.prefixes.longest_match(path))
    }

    /// Total number of registered routes.
    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup_pattern(&self, path: &str, mode: MatchMode) -> Option<&Route<H>> {
        match mode {
            MatchMode::Exact => self.exact.get(path),
            MatchMode::PrefixOfPath => self.prefixes.get(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(paths: &[&'static str]) -> Router<&'static str> {
        let mut router = Router::new();
        for p in paths {
            router.register(*p, *p, *p).unwrap();
        }
        router
    }

    fn handler_for(router: &Router<&'static str>, path: &str) -> Option<&'static str> {
        router.match_path(path).map(|r| r.handler)
    }

    #[test]
    fn test_trailing_slash_selects_mode() {
        let mut r = Router::new();
        assert_eq!(r.register("a", "/api/", ()).unwrap(), MatchMode::PrefixOfPath);
        assert_eq!(r.register("h", "/health", ()).unwrap(), MatchMode::Exact);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_exact_only_matches_identical_path() {
        let r = router(&["/health"]);
        assert_eq!(handler_for(&r, "/health"), Some("/health"));
        assert_eq!(handler_for(&r, "/health/"), None);
        assert_eq!(handler_for(&r, "/healthz"), None);
    }

    #[test]
    fn test_exact_beats_longer_prefix() {
        let r = router(&["/", "/a/", "/a/b/", "/a/b/c"]);
        assert_eq!(handler_for(&r, "/a/b/c"), Some("/a/b/c"));
        assert_eq!(handler_for(&r, "/a/b/cd"), Some("/a/b/"));
        assert_eq!(handler_for(&r, "/a/b/c/"), Some("/a/b/"));
    }

    #[test]
    fn test_exact_wins_over_prefix_with_same_text() {
        // "/a/" as exact cannot exist, but "/a" exact vs "/" prefix can.
        let r = router(&["/", "/a"]);
        assert_eq!(handler_for(&r, "/a"), Some("/a"));
        assert_eq!(handler_for(&r, "/b"), Some("/"));
    }

    #[test]
    fn test_no_match_is_none() {
        let r = router(&["/api/", "/health"]);
        assert!(r.match_path("/unknown").is_none());
        assert!(r.match_path("/api").is_none());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut r = Router::new();
        r.register("first", "/x", 1).unwrap();
        r.register("prefix", "/x/", 2).unwrap();

        let err = r.register("second", "/x", 3).unwrap_err();
        assert_eq!(
            err,
            RouteConflict {
                path: "/x".into(),
                existing: "first".into()
            }
        );
        let err = r.register("again", "/x/", 4).unwrap_err();
        assert_eq!(err.existing, "prefix");

        assert_eq!(r.match_path("/x").map(|route| route.handler), Some(1));
        assert_eq!(r.match_path("/x/y").map(|route| route.handler), Some(2));
        assert_eq!(r.len(), 2);
    }
}
