//! Reference classification
//!
//! Recognizes `{ "$ref": "<target>" }` nodes and tags their target as a
//! local fragment, a web URI or a file path.
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use url::Url;

/// The reference key
pub const REF_KEY: &str = "$ref";

/// Kind of target a `$ref` value points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    /// `#/...` fragment inside the document owning the reference
    Local,
    /// Relative or absolute path, optionally with a fragment
    File,
    /// Absolute `http`/`https` URI
    Web,
}

impl RefType {
    /// Registry tag for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RefType::Local => "local",
            RefType::File => "file",
            RefType::Web => "web",
        }
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get the `$ref` value of a node.
///
/// Returns `None` unless the node is a mapping whose `$ref` is a non-empty
/// string. Sibling keys are allowed.
pub fn ref_value(node: &Value) -> Option<&str> {
    node.as_object()?
        .get(REF_KEY)?
        .as_str()
        .filter(|value| !value.is_empty())
}

/// Classify a node, `None` when it is not a reference
pub fn classify(node: &Value) -> Option<RefType> {
    ref_value(node).map(classify_value)
}

/// Classify a raw `$ref` string
pub fn classify_value(value: &str) -> RefType {
    if value.starts_with('#') {
        RefType::Local
    } else if is_web_uri(value) {
        RefType::Web
    } else {
        RefType::File
    }
}

/// The file portion of a reference, i.e. everything before the first `#`.
///
/// A value starting with `#` is returned unchanged.
pub fn ref_file_path(value: &str) -> &str {
    match value.find('#') {
        Some(index) if index > 0 => &value[..index],
        _ => value,
    }
}

/// The fragment of a reference, i.e. everything after the first `#`
pub fn ref_fragment(value: &str) -> Option<&str> {
    value.find('#').map(|index| &value[index + 1..])
}

fn is_web_uri(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// Collect every `$ref` value in a document with its classification
pub fn extract_references(value: &Value) -> BTreeSet<(String, RefType)> {
    let mut references = BTreeSet::new();
    extract_refs_recursive(value, &mut references);
    references
}

fn extract_refs_recursive(value: &Value, references: &mut BTreeSet<(String, RefType)>) {
    if let Some(reference) = ref_value(value) {
        references.insert((reference.to_string(), classify_value(reference)));
    }
    match value {
        Value::Object(obj) => {
            for val in obj.values() {
                extract_refs_recursive(val, references);
            }
        }
        Value::Array(arr) => {
            for item in arr {
                extract_refs_recursive(item, references);
            }
        }
        _ => {}
    }
}
