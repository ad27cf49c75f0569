//! Static circular reference detection
//!
//! Cheap pre-pass over the local references of a single document, run
//! before any substitution happens. Cycles that only show up once external
//! documents are loaded are caught later by the resolution history.
//!
//! Copyright (c) 2025 Schema Deref Team
//! Licensed under the Apache-2.0 license

use crate::error::{DerefError, DerefResult};
use crate::reference::{classify_value, ref_value, RefType};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::Value;
use std::collections::HashMap;

/// A local reference found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEdge {
    /// Slash-joined path of the referencing node
    pub from: String,
    /// The `$ref` value, e.g. `#/definitions/a`
    pub to: String,
}

/// Directed graph of node paths, rejecting edges that close a cycle
#[derive(Debug, Default)]
struct ReferenceGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl ReferenceGraph {
    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            return index;
        }
        let index = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), index);
        index
    }

    /// Add `from -> to`. Returns `false` if the edge would close a cycle.
    fn add_edge(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if self.graph.contains_edge(from_idx, to_idx) {
            return true;
        }
        if has_path_connecting(&self.graph, to_idx, from_idx, None) {
            return false;
        }
        self.graph.add_edge(from_idx, to_idx, ());
        true
    }
}

/// Collect every local reference in the document with the path of the node
/// that holds it
pub fn collect_local_edges(document: &Value) -> Vec<LocalEdge> {
    let mut edges = Vec::new();
    let mut path = Vec::new();
    collect_recursive(document, &mut path, &mut edges);
    edges
}

fn collect_recursive(value: &Value, path: &mut Vec<String>, edges: &mut Vec<LocalEdge>) {
    if let Some(reference) = ref_value(value) {
        if classify_value(reference) == RefType::Local {
            edges.push(LocalEdge {
                from: path.join("/"),
                to: reference.to_string(),
            });
        }
    }

    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                path.push(key.clone());
                collect_recursive(child, path, edges);
                path.pop();
            }
        }
        Value::Array(arr) => {
            for (index, child) in arr.iter().enumerate() {
                path.push(index.to_string());
                collect_recursive(child, path, edges);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Check the document's local references for circularity.
///
/// Fails on any reference to the bare root `#`, on an edge closing a cycle,
/// and on a reference whose target is an ancestor of (or equal to) the
/// referencing node.
pub fn check_local_circular(document: &Value) -> DerefResult<()> {
    let edges = collect_local_edges(document);
    if edges.is_empty() {
        return Ok(());
    }

    if edges.iter().any(|edge| edge.to == "#") {
        return Err(DerefError::self_reference(None));
    }

    let mut graph = ReferenceGraph::default();
    for edge in &edges {
        let from = format!("{}/", edge.from);
        let dest: String = edge.to.chars().skip(2).chain(Some('/')).collect();

        if !graph.add_edge(&from, &dest) || from.starts_with(&dest) {
            tracing::debug!(from = %edge.from, to = %edge.to, "local circular reference");
            return Err(DerefError::self_reference(Some((&edge.from, &edge.to))));
        }
    }

    Ok(())
}
