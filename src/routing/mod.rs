//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     UpstreamConfig[]
//!     → router.rs (classify: trailing '/' = prefix, else exact)
//!     → exact map + matcher.rs prefix trie
//!     → Freeze inside an immutable Dispatcher
//!
//! Incoming Request (path)
//!     → router.rs exact lookup
//!     → matcher.rs longest prefix (only if no exact hit)
//!     → Return: matched Route or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (map + trie only)
//! - Deterministic: same input always matches same route
//! - Exact beats prefix; among prefixes the longest wins

pub mod matcher;
pub mod router;

pub use matcher::PrefixTrie;
pub use router::{MatchMode, Route, RouteConflict, Router};
