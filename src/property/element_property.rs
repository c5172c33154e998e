//! Typed per-element values with a default.
//!
//! The store keeps one default per element family plus explicit overrides,
//! so a property valuating millions of elements with the same value costs
//! two entries. Graph-scoped queries go through the hierarchy for
//! membership; the store itself is hierarchy-agnostic.

use std::fmt::Debug;

use crate::graph::element::{EdgeId, GraphId, NodeId};
use crate::graph::hierarchy::GraphHierarchy;

/// Bound required of property payloads.
pub trait PropertyValue: Clone + PartialOrd + PartialEq + Debug {}

impl<T: Clone + PartialOrd + PartialEq + Debug> PropertyValue for T {}

/// Default-plus-overrides value store for nodes and edges.
///
/// The store does not watch the hierarchy, and element ids are recycled:
/// an override left behind by a deleted element would apply verbatim to
/// the next element minted under the same id. Callers owning the deletion
/// must [`erase_node`](Self::erase_node) / [`erase_edge`](Self::erase_edge)
/// the retired id.
#[derive(Clone, Debug)]
pub struct ElementProperty<T: PropertyValue> {
    node_default: T,
    edge_default: T,
    node_overrides: hashbrown::HashMap<NodeId, T>,
    edge_overrides: hashbrown::HashMap<EdgeId, T>,
}

impl<T: PropertyValue> ElementProperty<T> {
    pub fn new(node_default: T, edge_default: T) -> Self {
        Self {
            node_default,
            edge_default,
            node_overrides: hashbrown::HashMap::new(),
            edge_overrides: hashbrown::HashMap::new(),
        }
    }

    pub fn node_default_value(&self) -> &T {
        &self.node_default
    }

    pub fn edge_default_value(&self) -> &T {
        &self.edge_default
    }

    pub fn node_value(&self, n: NodeId) -> &T {
        self.node_overrides.get(&n).unwrap_or(&self.node_default)
    }

    pub fn edge_value(&self, e: EdgeId) -> &T {
        self.edge_overrides.get(&e).unwrap_or(&self.edge_default)
    }

    pub fn set_node_value(&mut self, n: NodeId, v: T) {
        if v == self.node_default {
            self.node_overrides.remove(&n);
        } else {
            self.node_overrides.insert(n, v);
        }
    }

    pub fn set_edge_value(&mut self, e: EdgeId, v: T) {
        if v == self.edge_default {
            self.edge_overrides.remove(&e);
        } else {
            self.edge_overrides.insert(e, v);
        }
    }

    /// Makes `v` the value of every node, current and future.
    pub fn set_all_node_values(&mut self, v: T) {
        self.node_default = v;
        self.node_overrides.clear();
    }

    /// Makes `v` the value of every edge, current and future.
    pub fn set_all_edge_values(&mut self, v: T) {
        self.edge_default = v;
        self.edge_overrides.clear();
    }

    /// Drops the override of `n`, reverting it to the default.
    pub fn erase_node(&mut self, n: NodeId) {
        self.node_overrides.remove(&n);
    }

    /// Drops the override of `e`, reverting it to the default.
    pub fn erase_edge(&mut self, e: EdgeId) {
        self.edge_overrides.remove(&e);
    }

    pub fn has_non_default_valuated_nodes(&self) -> bool {
        !self.node_overrides.is_empty()
    }

    pub fn has_non_default_valuated_edges(&self) -> bool {
        !self.edge_overrides.is_empty()
    }

    /// Whether any node of `g` carries an override.
    pub fn has_non_default_valuated_nodes_in(&self, h: &GraphHierarchy, g: GraphId) -> bool {
        if g.is_root() {
            self.has_non_default_valuated_nodes()
        } else {
            self.node_overrides.keys().any(|&n| h.is_node_element(g, n))
        }
    }

    /// Whether any edge of `g` carries an override.
    pub fn has_non_default_valuated_edges_in(&self, h: &GraphHierarchy, g: GraphId) -> bool {
        if g.is_root() {
            self.has_non_default_valuated_edges()
        } else {
            self.edge_overrides.keys().any(|&e| h.is_edge_element(g, e))
        }
    }
}
