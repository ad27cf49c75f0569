//! Fragment path lookup
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use serde_json::Value;

/// Split a fragment into its non-empty path segments.
///
/// Everything up to and including the first `#` is dropped. Segments are
/// taken verbatim, `~0`/`~1` escapes are not decoded.
pub fn fragment_segments(ref_path: &str) -> impl Iterator<Item = &str> {
    let path = match ref_path.find('#') {
        Some(index) => &ref_path[index + 1..],
        None => ref_path,
    };
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Get the value at `ref_path` (e.g. `#/definitions/id`) within `document`.
///
/// Objects are indexed by key and arrays by decimal index. Returns `None`
/// if a segment is absent or the walk reaches a scalar.
pub fn get_ref_path_value<'a>(document: &'a Value, ref_path: &str) -> Option<&'a Value> {
    fragment_segments(ref_path).try_fold(document, |current, segment| match current {
        Value::Object(obj) => obj.get(segment),
        Value::Array(arr) => segment.parse::<usize>().ok().and_then(|index| arr.get(index)),
        _ => None,
    })
}
