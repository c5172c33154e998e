//! # graph-views
//!
//! graph-views is a storage engine for hierarchical attributed multigraphs:
//! one canonical topology at the root of a tree of subgraph views, each view
//! a filtered window onto its parent that stays structurally consistent
//! under every mutation. It is the kind of core a graph-visualization or
//! graph-analysis workbench builds on, where dozens of nested selections of
//! one large graph must share storage and react to edits.
//!
//! ## Features
//! - Compact `u32` element ids with low-end-biased recycling, so id space
//!   stays dense under churn
//! - Dense and sparse position-indexed element sets sharing one contract
//! - A subgraph arena with cascade semantics: deletions run leaves-first,
//!   creations register top-down, endpoint rewiring evicts views that no
//!   longer cover an edge
//! - Typed structural events drained from an internal log instead of
//!   callback observers
//! - A lazily computed, event-invalidated per-graph min/max cache over
//!   typed element properties
//! - Debug-gated invariant validation (`check-invariants` /
//!   `strict-invariants` features) and property-based testing
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! graph-views = "0.1"
//! # features = ["rayon"]
//! ```
//!
//! Everything hangs off [`graph::GraphHierarchy`]:
//!
//! ```
//! use graph_views::prelude::*;
//!
//! let mut h = GraphHierarchy::new();
//! let root = GraphId::ROOT;
//! let nodes = h.add_nodes(root, 3);
//! let e = h.add_edge(root, nodes[0], nodes[1]);
//! let sg = h.add_subgraph_filtered(root, |n| n != nodes[2], |_| true);
//! assert!(h.is_edge_element(sg, e));
//! h.del_node(root, nodes[0], false);
//! assert!(!h.is_edge_element(sg, e));
//! ```

pub mod debug_invariants;
pub mod graph;
pub mod graph_error;
pub mod property;

pub use debug_invariants::DebugInvariants;
pub use graph_error::GraphError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::graph::element::{EdgeId, GraphId, NodeId};
    pub use crate::graph::event::GraphEvent;
    pub use crate::graph::hierarchy::GraphHierarchy;
    pub use crate::graph::id_alloc::{IdAllocator, IdAllocatorState};
    pub use crate::graph::id_set::{DenseIdSet, IndexedSet, SparseIdSet};
    pub use crate::graph::incidence::IncidenceRecord;
    pub use crate::graph::storage::GraphStorage;
    pub use crate::graph_error::GraphError;
    pub use crate::property::element_property::{ElementProperty, PropertyValue};
    pub use crate::property::min_max::MinMaxProperty;
}
