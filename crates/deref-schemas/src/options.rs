//! Per-call configuration
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use crate::loader::{FileLoader, Loader, LoaderRegistry};
use crate::reference::RefType;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for a dereferencing call
#[derive(Debug, Clone, Default)]
pub struct DerefOptions {
    /// Base directory for relative file references. `None` means the
    /// process working directory.
    pub base_folder: Option<PathBuf>,
    /// Fail on the first reference that cannot be resolved instead of
    /// leaving it intact
    pub fail_on_missing: bool,
    /// Loaders for non-local reference kinds
    pub loaders: LoaderRegistry,
    /// Merge properties found beside `$ref` onto the resolved value,
    /// overriding its own keys
    pub merge_additional_properties: bool,
    /// Strip a top-level `$id` from resolved values
    pub remove_ids: bool,
}

impl DerefOptions {
    /// Create options with every default
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base directory for relative file references
    pub fn with_base_folder(mut self, base_folder: impl Into<PathBuf>) -> Self {
        self.base_folder = Some(base_folder.into());
        self
    }

    /// Set whether unresolved references abort the call
    pub fn with_fail_on_missing(mut self, fail_on_missing: bool) -> Self {
        self.fail_on_missing = fail_on_missing;
        self
    }

    /// Set whether sibling properties are merged onto resolved values
    pub fn with_merge_additional_properties(mut self, merge: bool) -> Self {
        self.merge_additional_properties = merge;
        self
    }

    /// Set whether `$id` is stripped from resolved values
    pub fn with_remove_ids(mut self, remove_ids: bool) -> Self {
        self.remove_ids = remove_ids;
        self
    }

    /// Register a loader for a reference kind, replacing any previous one
    pub fn with_loader(mut self, ref_type: RefType, loader: impl Loader + 'static) -> Self {
        self.loaders.register(ref_type, Arc::new(loader));
        self
    }

    /// Register the JSON file loader for file references
    pub fn with_file_loader(self) -> Self {
        self.with_loader(RefType::File, FileLoader::new())
    }

    /// The base directory, falling back to the process working directory
    pub fn resolved_base_folder(&self) -> PathBuf {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match &self.base_folder {
            Some(base) if base.is_absolute() => base.clone(),
            Some(base) => cwd.join(base),
            None => cwd,
        }
    }

    /// Copy of these options rebased onto another directory
    pub(crate) fn rebased(&self, base_folder: &Path) -> Self {
        Self {
            base_folder: Some(base_folder.to_path_buf()),
            ..self.clone()
        }
    }
}
