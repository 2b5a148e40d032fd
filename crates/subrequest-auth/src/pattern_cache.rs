//! Compiled-regex memoization.
//!
//! Policies are typically a small fixed set per deployment, so each distinct
//! pattern string is compiled approximately once for the process lifetime
//! and reused across requests. Compile failures are remembered too: a
//! malformed pattern is logged once and treated as a non-match thereafter.
//!
//! Concurrent inserts for the same pattern may race; the loser's compile is
//! wasted but the map never holds a partial entry. At-most-one compile is a
//! performance goal, not a guarantee. The cache grows unboundedly, bounded
//! in practice by the finite set of distinct patterns seen.

use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Shared cache of compiled regex patterns keyed by pattern string.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: RwLock<HashMap<String, Option<Regex>>>,
    compiles: AtomicU64,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test `value` against `pattern`, compiling and caching the pattern on
    /// first use. Matching is unanchored: the pattern may match anywhere in
    /// the value. A malformed pattern never matches.
    pub fn is_match(&self, pattern: &str, value: &str) -> bool {
        {
            let cache = self
                .patterns
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cache.get(pattern) {
                return entry.as_ref().is_some_and(|re| re.is_match(value));
            }
        }

        // Compile outside the lock; a racing request may compile too.
        self.compiles.fetch_add(1, Ordering::Relaxed);
        let compiled = match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(
                    target: "sra.pattern_cache",
                    pattern = %pattern,
                    error = %e,
                    "Failed to compile claim pattern, treating as non-match"
                );
                None
            }
        };

        let matched = compiled.as_ref().is_some_and(|re| re.is_match(value));

        let mut cache = self
            .patterns
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        cache.entry(pattern.to_string()).or_insert(compiled);

        matched
    }

    /// Number of distinct patterns cached so far.
    pub fn len(&self) -> usize {
        self.patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total regex compilations performed. Exposed so tests can assert
    /// caching behavior without relying on timing.
    pub fn compile_count(&self) -> u64 {
        self.compiles.load(Ordering::Relaxed)
    }
}
