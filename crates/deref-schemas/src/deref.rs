//! Public entry points
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use crate::cache::DocumentCache;
use crate::engine::deref_schema;
use crate::error::{DerefError, DerefResult};
use crate::options::DerefOptions;
use crate::state::ResolutionState;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// A dereferenced document with the references left intact
#[derive(Debug, Clone, PartialEq)]
pub struct DerefReport {
    /// The dereferenced document
    pub document: Value,
    /// References that could not be resolved, in discovery order
    pub missing: Vec<String>,
}

impl DerefReport {
    /// Check if every reference resolved
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Dereference every `$ref` in `schema` with a fresh cache.
///
/// The input is never modified; the result is a new document.
pub fn deref<T>(schema: &T, options: &DerefOptions) -> DerefResult<Value>
where
    T: Serialize + ?Sized,
{
    let mut cache = DocumentCache::new();
    deref_with_cache(schema, options, &mut cache)
}

/// Dereference `schema`, sharing external documents through `cache`
pub fn deref_with_cache<T>(
    schema: &T,
    options: &DerefOptions,
    cache: &mut DocumentCache,
) -> DerefResult<Value>
where
    T: Serialize + ?Sized,
{
    deref_report_with_cache(schema, options, cache).map(|report| report.document)
}

/// Dereference `schema` and report references left unresolved
pub fn deref_report<T>(schema: &T, options: &DerefOptions) -> DerefResult<DerefReport>
where
    T: Serialize + ?Sized,
{
    let mut cache = DocumentCache::new();
    deref_report_with_cache(schema, options, &mut cache)
}

/// [`deref_report`] with a caller-owned cache
pub fn deref_report_with_cache<T>(
    schema: &T,
    options: &DerefOptions,
    cache: &mut DocumentCache,
) -> DerefResult<DerefReport>
where
    T: Serialize + ?Sized,
{
    let document = serde_json::to_value(schema).map_err(DerefError::serialization)?;
    let identity = fingerprint(&document)?;
    let cwd = options.resolved_base_folder();

    tracing::debug!(
        identity = %identity,
        base_folder = %cwd.display(),
        "dereferencing document"
    );

    let mut state = ResolutionState::new(identity, cwd, cache);
    let document = deref_schema(document, options, &mut state)?;

    if !state.missing.is_empty() {
        tracing::debug!(missing = ?state.missing, "references left unresolved");
    }
    Ok(DerefReport {
        document,
        missing: state.missing,
    })
}

/// Hex SHA-256 of the compact JSON form of a document
pub fn fingerprint(document: &Value) -> DerefResult<String> {
    let serialized = serde_json::to_string(document).map_err(DerefError::serialization)?;
    Ok(hex::encode(Sha256::digest(serialized.as_bytes())))
}
