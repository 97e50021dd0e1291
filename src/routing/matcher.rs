//! Prefix route matching.
//!
//! # Responsibilities
//! - Store prefix patterns (paths ending in `/`) keyed by path segment
//! - Find the longest stored prefix of a request path
//!
//! # Design Decisions
//! - Segment trie: lookup cost grows with request depth, not route count
//! - Pattern `P/` matches path `X` exactly when `X` starts with `P/`.
//!   In segments: the pattern's segments are a leading run of the path's
//!   segments and the path has at least one segment after them
//! - Path matching is case-sensitive and on the raw (still encoded) path

use std::collections::HashMap;

/// Longest-prefix lookup over `/`-terminated patterns.
#[derive(Debug)]
pub struct PrefixTrie<T> {
    root: Node<T>,
    len: usize,
}

#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    children: HashMap<String, Node<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            value: None,
            children: HashMap::new(),
        }
    }
}

impl<T> Default for PrefixTrie<T> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }
}

impl<T> PrefixTrie<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored patterns.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `value` under `pattern`, which must end with `/`.
    ///
    /// Returns the value previously stored under the same pattern.
    pub fn insert(&mut self, pattern: &str, value: T) -> Option<T> {
        debug_assert!(pattern.ends_with('/'));
        let mut node = &mut self.root;
        for segment in pattern_segments(pattern) {
            node = node.children.entry(segment.to_string()).or_default();
        }
        let previous = node.value.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Value of the stored pattern under exactly `pattern`.
    pub fn get(&self, pattern: &str) -> Option<&T> {
        let mut node = &self.root;
        for segment in pattern_segments(pattern) {
            node = node.children.get(segment)?;
        }
        node.value.as_ref()
    }

    /// Value of the longest stored pattern that is a prefix of `path`.
    pub fn longest_match(&self, path: &str) -> Option<&T> {
        let mut best = None;
        let mut node = &self.root;
        let mut segments = path.split('/').peekable();

        while let Some(segment) = segments.next() {
            node = match node.children.get(segment) {
                Some(child) => child,
                None => break,
            };
            // The separator that ends the pattern must be present in the path.
            if segments.peek().is_some() {
                if let Some(value) = node.value.as_ref() {
                    best = Some(value);
                }
            }
        }
        best
    }
}

/// Segments of a pattern with its terminating `/` removed.
///
/// `/` → `[""]`, `/api/` → `["", "api"]`.
fn pattern_segments(pattern: &str) -> std::str::Split<'_, char> {
    pattern.strip_suffix('/').unwrap_or(pattern).split('/')
}
