//! Resolution engine
//!
//! Walks a document depth-first in pre-order and replaces every reference
//! node with the value it points to. The walk runs over an owned document
//! and addresses nodes by their path from the root, so a node can be
//! replaced while the root stays available for local lookups.
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use crate::circular::check_local_circular;
use crate::error::{DerefError, DerefResult};
use crate::loader::resolve_reference;
use crate::options::DerefOptions;
use crate::pointer::fragment_segments;
use crate::reference::{classify_value, ref_value, RefType, REF_KEY};
use crate::state::{HistoryEntry, ResolutionState};
use serde_json::{Map, Value};

/// Key stripped from resolved values when `remove_ids` is set
pub const ID_KEY: &str = "$id";

/// One step from a node to one of its children
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// What the walk does after visiting a reference node
#[derive(Debug)]
enum Step {
    /// Leave the node alone and do not look inside it
    Stop,
    /// Visit every child of the node
    Descend,
    /// Visit the substituted node again while the given local destination
    /// is expanding
    Expand(String),
    /// Visit only these keys of the node
    DescendInto(Vec<String>),
}

/// Dereference every reference in `schema`.
///
/// Runs the static circular check first, then walks the document with the
/// shared `state`. Loaders call back into this function for the content they
/// load, so one state spans the whole tree of documents.
pub fn deref_schema(
    mut schema: Value,
    options: &DerefOptions,
    state: &mut ResolutionState<'_>,
) -> DerefResult<Value> {
    check_local_circular(&schema)?;

    if let Some(error) = state.failure() {
        return Err(error);
    }

    let mut walker = Walker {
        options,
        state: &mut *state,
        expanding: Vec::new(),
    };
    walker.visit(&mut schema, &mut Vec::new());

    match state.failure() {
        Some(error) => Err(error),
        None => Ok(schema),
    }
}

struct Walker<'a, 'c> {
    options: &'a DerefOptions,
    state: &'a mut ResolutionState<'c>,
    /// Local destinations whose substituted content is being walked
    expanding: Vec<String>,
}

impl Walker<'_, '_> {
    fn visit(&mut self, root: &mut Value, path: &mut Vec<Segment>) {
        if self.state.has_failed() {
            return;
        }
        let Some(node) = node_at(root, path) else {
            return;
        };

        if let Some(reference) = ref_value(node).map(str::to_owned) {
            let ref_type = classify_value(&reference);
            match self.substitute(root, path, &reference, ref_type) {
                Step::Stop => {}
                Step::Descend => self.visit_children(root, path),
                Step::Expand(destination) => {
                    // the copied target may itself be a reference
                    self.expanding.push(destination);
                    self.visit(root, path);
                    self.expanding.pop();
                }
                Step::DescendInto(keys) => {
                    for key in keys {
                        path.push(Segment::Key(key));
                        self.visit(root, path);
                        path.pop();
                    }
                }
            }
            return;
        }

        self.visit_children(root, path);
    }

    fn visit_children(&mut self, root: &mut Value, path: &mut Vec<Segment>) {
        let children: Vec<Segment> = match node_at(root, path) {
            Some(Value::Object(obj)) => obj.keys().cloned().map(Segment::Key).collect(),
            Some(Value::Array(arr)) => (0..arr.len()).map(Segment::Index).collect(),
            _ => Vec::new(),
        };
        for child in children {
            path.push(child);
            self.visit(root, path);
            path.pop();
        }
    }

    fn substitute(
        &mut self,
        root: &mut Value,
        path: &[Segment],
        reference: &str,
        ref_type: RefType,
    ) -> Step {
        let expansion = (ref_type == RefType::Local)
            .then(|| format!("{}:{}", self.state.current, reference).to_lowercase());
        if let Some(destination) = &expansion {
            if self.expanding.contains(destination) {
                return self.reject(root, path, reference);
            }
        }

        let entry = self.state.enter(ref_type, reference);
        if entry == HistoryEntry::Circular {
            return self.reject(root, path, reference);
        }

        if ref_type == RefType::Local {
            self.settle_pointer(root, path, reference);
        }

        let previous = self.state.switch_current(ref_type, reference);
        let resolved = resolve_reference(reference, ref_type, root, self.options, self.state);
        self.state.restore_current(previous);
        if entry == HistoryEntry::Recorded {
            self.state.leave();
        }

        if self.state.has_failed() {
            return Step::Stop;
        }

        let Some(mut value) = resolved else {
            tracing::debug!(reference = %reference, ref_type = %ref_type, "unresolved reference");
            self.state.add_missing(reference);
            if self.options.fail_on_missing {
                self.state.record_error(DerefError::missing(reference));
                return Step::Stop;
            }
            return Step::Descend;
        };

        if self.options.remove_ids {
            if let Some(obj) = value.as_object_mut() {
                obj.remove(ID_KEY);
            }
        }

        let mut sibling_keys = Vec::new();
        if self.options.merge_additional_properties {
            if let Some(Value::Object(mut siblings)) = node_at(root, path).cloned() {
                siblings.remove(REF_KEY);
                sibling_keys = siblings.keys().cloned().collect();
                let mut merged = Value::Object(Map::new());
                merge_values(&mut merged, keyed(value));
                merge_values(&mut merged, Value::Object(siblings));
                value = merged;
            }
        }

        tracing::trace!(reference = %reference, ref_type = %ref_type, "substituted reference");
        if let Some(node) = node_at_mut(root, path) {
            *node = value;
        }
        self.state.remove_missing(reference);

        match expansion {
            Some(destination) => Step::Expand(destination),
            None => Step::DescendInto(sibling_keys),
        }
    }

    /// Substitute the references met part way along a local pointer, so the
    /// lookup can pass through them.
    ///
    /// A reference node that is the referencing node itself, or one of its
    /// ancestors, is left alone and the lookup fails as usual.
    fn settle_pointer(&mut self, root: &mut Value, path: &[Segment], reference: &str) {
        let segments: Vec<&str> = fragment_segments(reference).collect();
        let mut target: Vec<Segment> = Vec::new();

        for segment in segments.iter().take(segments.len().saturating_sub(1)) {
            let next = match node_at(root, &target) {
                Some(Value::Object(_)) => Segment::Key((*segment).to_string()),
                Some(Value::Array(_)) => match segment.parse() {
                    Ok(index) => Segment::Index(index),
                    Err(_) => return,
                },
                _ => return,
            };
            target.push(next);

            let is_reference = node_at(root, &target).map(|node| ref_value(node).is_some());
            match is_reference {
                Some(true) => {
                    if path.starts_with(&target) {
                        return;
                    }
                    tracing::trace!(reference = %reference, "resolving reference along pointer");
                    let outer = std::mem::take(&mut self.expanding);
                    self.visit(root, &mut target);
                    self.expanding = outer;
                    if self.state.has_failed() {
                        return;
                    }
                }
                Some(false) => {}
                None => return,
            }
        }
    }

    /// Record a circular reference and blank the node that closed it
    fn reject(&mut self, root: &mut Value, path: &[Segment], reference: &str) -> Step {
        tracing::debug!(reference = %reference, "circular reference");
        self.state.record_circular(reference);
        if let Some(node) = node_at_mut(root, path) {
            *node = Value::Null;
        }
        Step::Stop
    }
}

fn node_at<'v>(root: &'v Value, path: &[Segment]) -> Option<&'v Value> {
    path.iter().try_fold(root, |current, segment| match (current, segment) {
        (Value::Object(obj), Segment::Key(key)) => obj.get(key),
        (Value::Array(arr), Segment::Index(index)) => arr.get(*index),
        _ => None,
    })
}

fn node_at_mut<'v>(root: &'v mut Value, path: &[Segment]) -> Option<&'v mut Value> {
    path.iter().try_fold(root, |current, segment| match (current, segment) {
        (Value::Object(obj), Segment::Key(key)) => obj.get_mut(key),
        (Value::Array(arr), Segment::Index(index)) => arr.get_mut(*index),
        _ => None,
    })
}

/// Object form of a resolved value before siblings merge onto it: array
/// elements are keyed by index and scalars contribute no keys.
fn keyed(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
        ),
        Value::Object(_) => value,
        _ => Value::Object(Map::new()),
    }
}

/// Deep-merge `source` into `target`.
///
/// Objects merge key by key and arrays index by index; any other source
/// value replaces the target.
pub fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => {
            for (index, value) in source.into_iter().enumerate() {
                match target.get_mut(index) {
                    Some(existing) => merge_values(existing, value),
                    None => target.push(value),
                }
            }
        }
        (target, source) => *target = source,
    }
}
