//! JSON file loader
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use crate::loader::Loader;
use crate::options::DerefOptions;
use crate::reference::ref_file_path;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Scheme prefix accepted in front of file references
pub const FILE_SCHEME: &str = "file:";

/// Reasons a file could not be loaded.
///
/// These never leave the loader: [`Loader::load`] logs them and reports the
/// reference as missing.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File I/O errors
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parsing errors
    #[error("Failed to parse JSON file '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Get the path associated with this error
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Json { path, .. } => path,
        }
    }
}

/// The filesystem path of a file reference: scheme and fragment removed
pub fn reference_path(ref_value: &str) -> PathBuf {
    let value = ref_value.strip_prefix(FILE_SCHEME).unwrap_or(ref_value);
    PathBuf::from(ref_file_path(value))
}

/// Join `path` onto `base` unless it is absolute, then normalize `.` and
/// `..` components lexically
pub fn resolve_path(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let joined = base.join(path);
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Absolute path a file reference points to under the given options
pub fn resolve_reference_path(ref_value: &str, options: &DerefOptions) -> PathBuf {
    resolve_path(&options.resolved_base_folder(), reference_path(ref_value))
}

/// Loads file references as JSON documents from the local filesystem.
///
/// Relative paths resolve against `base_folder`, which is rebased onto each
/// loaded file's directory while that file's own references are resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    /// Create a new file loader
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a JSON file
    pub fn read_json(&self, path: &Path) -> Result<Value, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Loader for FileLoader {
    fn load(&self, ref_value: &str, options: &DerefOptions) -> Option<Value> {
        let path = resolve_reference_path(ref_value, options);
        match self.read_json(&path) {
            Ok(value) => {
                tracing::trace!(path = %path.display(), "loaded file reference");
                Some(value)
            }
            Err(error) => {
                tracing::debug!(reference = %ref_value, %error, "file reference could not be loaded");
                None
            }
        }
    }
}
