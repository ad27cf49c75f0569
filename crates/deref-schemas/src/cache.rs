//! Cache of fully dereferenced external documents
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Cache keyed by absolute file identity.
///
/// Entries hold documents whose own references are already resolved, so a
/// file referenced many times is loaded and dereferenced once. The cache is
/// unbounded; reuse one instance across calls to share work between them.
#[derive(Debug, Clone, Default)]
pub struct DocumentCache {
    entries: HashMap<PathBuf, Value>,
}

impl DocumentCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached document
    pub fn get(&self, path: &Path) -> Option<&Value> {
        self.entries.get(path)
    }

    /// Store a document unless one is already cached for this path.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn insert(&mut self, path: PathBuf, content: Value) -> bool {
        if self.entries.contains_key(&path) {
            return false;
        }
        self.entries.insert(path, content);
        true
    }

    /// Check if the cache contains a path
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Remove a specific entry from the cache
    pub fn remove(&mut self, path: &Path) -> Option<Value> {
        self.entries.remove(path)
    }

    /// Clear all cache entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached documents
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over cached paths
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }
}
