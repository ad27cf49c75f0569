//! Loaders for non-local references
//!
//! A [`Loader`] turns a reference value into document content. The
//! [`LoaderRegistry`] maps each [`RefType`] to at most one loader; new
//! transports are added by implementing the trait and registering it.
//!
//! # Example Usage
//!
//! ```rust
//! use deref_schemas::{deref, DerefOptions, Loader, RefType};
//! use serde_json::{json, Value};
//!
//! #[derive(Debug)]
//! struct Fixed;
//!
//! impl Loader for Fixed {
//!     fn load(&self, _ref_value: &str, _options: &DerefOptions) -> Option<Value> {
//!         Some(json!({"definitions": {"id": {"type": "integer"}}}))
//!     }
//! }
//!
//! let options = DerefOptions::new().with_loader(RefType::Web, Fixed);
//! let schema = json!({"$ref": "https://example.com/common.json#/definitions/id"});
//! assert_eq!(deref(&schema, &options)?, json!({"type": "integer"}));
//! # Ok::<(), deref_schemas::DerefError>(())
//! ```
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

pub mod file;

pub use file::{FileLoader, LoadError};

use crate::engine::deref_schema;
use crate::options::DerefOptions;
use crate::pointer::get_ref_path_value;
use crate::reference::{ref_fragment, RefType};
use crate::state::ResolutionState;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Source of content for one kind of reference
pub trait Loader: fmt::Debug + Send + Sync {
    /// Load the raw content a reference points to.
    ///
    /// Failures (unreadable or unparsable content) are swallowed and reported
    /// as `None`; they surface as a missing reference.
    fn load(&self, ref_value: &str, options: &DerefOptions) -> Option<Value>;

    /// Produce the fully dereferenced value a reference points to.
    ///
    /// The provided implementation loads the content (or takes it from the
    /// cache), dereferences it, caches it, and applies the fragment.
    fn get_ref_schema(
        &self,
        ref_value: &str,
        ref_type: RefType,
        _parent: &Value,
        options: &DerefOptions,
        state: &mut ResolutionState<'_>,
    ) -> Option<Value> {
        resolve_external(self, ref_value, ref_type, options, state)
    }
}

/// Loaders registered per reference kind
#[derive(Debug, Clone, Default)]
pub struct LoaderRegistry {
    loaders: HashMap<RefType, Arc<dyn Loader>>,
}

impl LoaderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader, returning the one it replaces
    pub fn register(&mut self, ref_type: RefType, loader: Arc<dyn Loader>) -> Option<Arc<dyn Loader>> {
        self.loaders.insert(ref_type, loader)
    }

    /// Get the loader for a reference kind
    pub fn get(&self, ref_type: RefType) -> Option<&Arc<dyn Loader>> {
        self.loaders.get(&ref_type)
    }

    /// Remove the loader for a reference kind
    pub fn unregister(&mut self, ref_type: RefType) -> Option<Arc<dyn Loader>> {
        self.loaders.remove(&ref_type)
    }

    /// Number of registered loaders
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Check if no loader is registered
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

/// Resolve a reference to its target value.
///
/// A registered loader takes precedence; local references otherwise resolve
/// against `parent`, the document that owns the reference. `None` means the
/// reference could not be resolved.
pub fn resolve_reference(
    ref_value: &str,
    ref_type: RefType,
    parent: &Value,
    options: &DerefOptions,
    state: &mut ResolutionState<'_>,
) -> Option<Value> {
    if let Some(loader) = options.loaders.get(ref_type) {
        return loader.get_ref_schema(ref_value, ref_type, parent, options, state);
    }
    match ref_type {
        RefType::Local => get_ref_path_value(parent, ref_value).cloned(),
        _ => None,
    }
}

/// Default external resolution shared by every loader.
///
/// File references are cached under their absolute path once their own
/// references are resolved. Nested relative references resolve against the
/// loaded file's directory.
pub fn resolve_external<L: Loader + ?Sized>(
    loader: &L,
    ref_value: &str,
    ref_type: RefType,
    options: &DerefOptions,
    state: &mut ResolutionState<'_>,
) -> Option<Value> {
    let file_path = (ref_type == RefType::File).then(|| file::reference_path(ref_value));
    let identity = file_path
        .as_ref()
        .map(|path| file::resolve_path(&state.cwd, path));

    let cached = identity
        .as_ref()
        .and_then(|identity| state.cache.get(identity).cloned());

    let content = match cached {
        Some(content) => {
            tracing::debug!(reference = %ref_value, "using cached document");
            content
        }
        None => {
            let loaded = loader.load(ref_value, options)?;

            let base = match file_path.as_deref().and_then(Path::parent) {
                Some(dir) if !dir.as_os_str().is_empty() => file::resolve_path(&state.cwd, dir),
                _ => state.cwd.clone(),
            };
            let nested_options = options.rebased(&base);
            let previous_cwd = std::mem::replace(&mut state.cwd, base);
            let resolved = deref_schema(loaded, &nested_options, state);
            state.cwd = previous_cwd;

            match resolved {
                Ok(content) => content,
                Err(error) => {
                    state.record_error(error);
                    return None;
                }
            }
        }
    };

    if let Some(identity) = identity {
        state.cache.insert(identity, content.clone());
    }

    match ref_fragment(ref_value) {
        Some(fragment) => get_ref_path_value(&content, fragment).cloned(),
        None => Some(content),
    }
}
