//! Deref Schemas - JSON Schema `$ref` dereferencing
//!
//! This crate takes a JSON Schema document that uses `$ref` references and
//! produces a self-contained copy in which every resolvable reference is
//! replaced by the value it points to.
//!
//! ## Features
//!
//! - **Local references**: `#/json/pointer` fragments inside the same document
//! - **File references**: relative or absolute paths, optionally with a fragment
//! - **Pluggable loaders**: one [`Loader`] per reference kind, web included
//! - **Circular detection**: static graph check plus a dynamic history guard
//! - **Shared cache**: loaded files are dereferenced once per [`DocumentCache`]
//!
//! ## Quick Start
//!
//! ```rust
//! use deref_schemas::{deref, DerefOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"id": {"$ref": "#/definitions/id"}},
//!     "definitions": {"id": {"type": "integer"}}
//! });
//!
//! let resolved = deref(&schema, &DerefOptions::default()).unwrap();
//! assert_eq!(resolved["properties"]["id"], json!({"type": "integer"}));
//! ```
//!
//! ## Options
//!
//! - `base_folder`: directory relative file references resolve against
//! - `fail_on_missing`: abort on the first unresolved reference
//! - `merge_additional_properties`: keep keys written beside `$ref`
//! - `remove_ids`: strip `$id` from resolved values
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

pub mod cache;
pub mod circular;
pub mod deref;
pub mod engine;
pub mod error;
pub mod loader;
pub mod options;
pub mod pointer;
pub mod reference;
pub mod state;

// Re-export commonly used types for convenience
pub use cache::DocumentCache;
pub use circular::check_local_circular;
pub use deref::{
    deref, deref_report, deref_report_with_cache, deref_with_cache, fingerprint, DerefReport,
};
pub use engine::deref_schema;
pub use error::{DerefError, DerefResult};
pub use loader::{FileLoader, LoadError, Loader, LoaderRegistry};
pub use options::DerefOptions;
pub use pointer::get_ref_path_value;
pub use reference::{classify, extract_references, RefType, REF_KEY};
pub use state::{HistoryEntry, ResolutionState};
