//! The merged call graph and traversals over it.
//!
//! Built once by the extraction pipeline, then read-only. Persistent
//! collections keep clones cheap for concurrent traversal requests.

pub mod traversal;

pub use traversal::TreeBuilder;

use crate::core::{CallEdge, CallableKind};
use im::{HashMap, Vector};
use std::collections::BTreeMap;

/// Global adjacency over canonical lowercase names.
///
/// Every key was produced by the definitions pass (programs, functions,
/// subroutines, interfaces); interface nodes always have zero out-degree.
/// Lax explicit-call targets may appear inside edge lists without being
/// nodes themselves.
#[derive(Clone, Debug, Default)]
pub struct CallGraph {
    nodes: HashMap<String, CallableKind>,
    adjacency: HashMap<String, Vector<CallEdge>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node with an empty edge list. Returns false when the name
    /// is already present; the existing node (and its kind) stays.
    pub fn ensure_node(&mut self, name: &str, kind: CallableKind) -> bool {
        if self.nodes.contains_key(name) {
            return false;
        }
        self.nodes.insert(name.to_string(), kind);
        self.adjacency.insert(name.to_string(), Vector::new());
        true
    }

    /// Append one edge to a caller's list, preserving source order.
    pub fn add_call(&mut self, caller: &str, edge: CallEdge) {
        debug_assert!(
            self.nodes.contains_key(caller),
            "edge recorded for unknown caller '{caller}'"
        );
        self.adjacency
            .entry(caller.to_string())
            .or_default()
            .push_back(edge);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node_kind(&self, name: &str) -> Option<CallableKind> {
        self.nodes.get(name).copied()
    }

    /// The recorded edges of a known name.
    ///
    /// Construction guarantees every traversed name is either a node or a
    /// terminal leaf that is never looked up, so an unknown name here is a
    /// defect: it trips an assertion in development and degrades to an
    /// empty list in release builds.
    pub fn edges(&self, name: &str) -> Vector<CallEdge> {
        if let Some(edges) = self.adjacency.get(name) {
            return edges.clone();
        }
        debug_assert!(false, "call graph lookup for unknown name '{name}'");
        log::error!("call graph lookup for unknown name '{name}', returning no edges");
        Vector::new()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.edges(name).len()
    }

    /// Deterministically ordered name -> out-degree map for reporting.
    pub fn call_counts(&self) -> BTreeMap<String, usize> {
        self.adjacency
            .iter()
            .map(|(name, edges)| (name.clone(), edges.len()))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vector::len).sum()
    }
}
