//! Per-call resolution state and the dynamic circular reference guard
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use crate::cache::DocumentCache;
use crate::error::DerefError;
use crate::reference::{ref_file_path, RefType};
use std::path::PathBuf;

/// Outcome of trying to enter a reference destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    /// Destination recorded; must be released with [`ResolutionState::leave`]
    Recorded,
    /// Bare `#` reference, accepted without being recorded
    Exempt,
    /// Destination already in progress
    Circular,
}

/// State shared by one top-level call and every nested loader call.
///
/// Holds the stack of destinations currently being resolved, used to detect
/// cycles that run through external documents.
#[derive(Debug)]
pub struct ResolutionState<'c> {
    /// Identity of the document owning the references being walked: the
    /// content hash of the root, or the path of a loaded file
    pub current: String,
    /// Directory relative file references are resolved against
    pub cwd: PathBuf,
    /// Case-folded destinations in progress
    pub history: Vec<String>,
    /// Resolved external documents
    pub cache: &'c mut DocumentCache,
    /// References that could not be resolved, in discovery order
    pub missing: Vec<String>,
    /// Whether a circular reference was detected
    pub circular: bool,
    /// Reference values that closed a cycle
    pub circular_refs: Vec<String>,
    /// First fatal error
    pub error: Option<DerefError>,
}

impl<'c> ResolutionState<'c> {
    /// Create the state for a top-level call
    pub fn new(current: impl Into<String>, cwd: PathBuf, cache: &'c mut DocumentCache) -> Self {
        Self {
            current: current.into(),
            cwd,
            history: Vec::new(),
            cache,
            missing: Vec::new(),
            circular: false,
            circular_refs: Vec::new(),
            error: None,
        }
    }

    /// History key for a reference
    fn destination(&self, ref_type: RefType, value: &str) -> Option<String> {
        match ref_type {
            RefType::File => Some(ref_file_path(value).to_lowercase()),
            _ if value == "#" => None,
            _ => Some(format!("{}:{}", self.current, value).to_lowercase()),
        }
    }

    /// Try to enter a reference destination
    pub fn enter(&mut self, ref_type: RefType, value: &str) -> HistoryEntry {
        let Some(dest) = self.destination(ref_type, value) else {
            return HistoryEntry::Exempt;
        };
        if self.history.contains(&dest) {
            return HistoryEntry::Circular;
        }
        self.history.push(dest);
        HistoryEntry::Recorded
    }

    /// Release a destination entered with [`HistoryEntry::Recorded`]
    pub fn leave(&mut self) -> Option<String> {
        self.history.pop()
    }

    /// Make `current` point at a file for the duration of its resolution.
    ///
    /// Returns the previous identity, to hand back to [`Self::restore_current`].
    pub fn switch_current(&mut self, ref_type: RefType, value: &str) -> Option<String> {
        if ref_type != RefType::File {
            return None;
        }
        let dest = ref_file_path(value).to_string();
        Some(std::mem::replace(&mut self.current, dest))
    }

    /// Restore the identity saved by [`Self::switch_current`]
    pub fn restore_current(&mut self, previous: Option<String>) {
        if let Some(previous) = previous {
            self.current = previous;
        }
    }

    /// Record a circular reference and its error
    pub fn record_circular(&mut self, value: &str) {
        self.circular = true;
        self.circular_refs.push(value.to_string());
        let error = DerefError::circular(self.circular_refs.clone());
        self.record_error(error);
    }

    /// Record a fatal error; the first one wins
    pub fn record_error(&mut self, error: DerefError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Track an unresolved reference
    pub fn add_missing(&mut self, value: &str) {
        if !self.missing.iter().any(|m| m == value) {
            self.missing.push(value.to_string());
        }
    }

    /// Forget an unresolved reference once it resolves
    pub fn remove_missing(&mut self, value: &str) {
        self.missing.retain(|m| m != value);
    }

    /// Whether the call has already failed
    pub fn has_failed(&self) -> bool {
        self.circular || self.error.is_some()
    }

    /// The error the call fails with, if it has failed
    pub fn failure(&self) -> Option<DerefError> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        if self.circular {
            return Some(DerefError::circular(self.circular_refs.clone()));
        }
        None
    }
}
