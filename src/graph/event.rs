//! Structural change notifications.
//!
//! Every mutation records typed events into a per-hierarchy log rather than
//! calling observers inline. Consumers (property caches, test harnesses,
//! undo machinery) drain the log with
//! [`GraphHierarchy::take_events`](crate::graph::hierarchy::GraphHierarchy::take_events)
//! and react after the fact, when the structure is already consistent.

use crate::graph::element::{EdgeId, GraphId, NodeId};

/// One structural change, tagged with the view it happened in.
///
/// Cascades produce one event per affected view: deleting a node from an
/// ancestor yields a `DelNode` for every descendant that contained it,
/// descendants first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    /// `node` became a member of `graph`.
    AddNode { graph: GraphId, node: NodeId },
    /// `count` nodes were added to `graph` in one bulk operation.
    AddNodes { graph: GraphId, count: usize },
    /// `edge` became a member of `graph`.
    AddEdge { graph: GraphId, edge: EdgeId },
    /// `count` edges were added to `graph` in one bulk operation.
    AddEdges { graph: GraphId, count: usize },
    /// `node` is about to leave `graph` (still queryable when emitted).
    DelNode { graph: GraphId, node: NodeId },
    /// `edge` is about to leave `graph` (still queryable when emitted).
    DelEdge { graph: GraphId, edge: EdgeId },
    /// `edge`'s endpoints are about to change, everywhere it is visible.
    BeforeSetEnds { graph: GraphId, edge: EdgeId },
    /// `edge`'s endpoints changed; `old` carries the previous pair.
    AfterSetEnds {
        graph: GraphId,
        edge: EdgeId,
        old: (NodeId, NodeId),
    },
    /// `edge`'s direction was flipped, everywhere it is visible.
    ReverseEdge { graph: GraphId, edge: EdgeId },
    /// `subgraph` was created under `graph`.
    AddSubGraph { graph: GraphId, subgraph: GraphId },
    /// `subgraph` (a direct child of `graph`) is being destroyed.
    DelSubGraph { graph: GraphId, subgraph: GraphId },
}

impl GraphEvent {
    /// The view this event belongs to.
    pub fn graph(&self) -> GraphId {
        match *self {
            GraphEvent::AddNode { graph, .. }
            | GraphEvent::AddNodes { graph, .. }
            | GraphEvent::AddEdge { graph, .. }
            | GraphEvent::AddEdges { graph, .. }
            | GraphEvent::DelNode { graph, .. }
            | GraphEvent::DelEdge { graph, .. }
            | GraphEvent::BeforeSetEnds { graph, .. }
            | GraphEvent::AfterSetEnds { graph, .. }
            | GraphEvent::ReverseEdge { graph, .. }
            | GraphEvent::AddSubGraph { graph, .. }
            | GraphEvent::DelSubGraph { graph, .. } => graph,
        }
    }
}
