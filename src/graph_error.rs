//! GraphError: unified error type for graph-views public APIs.
//!
//! Out-of-contract calls (mutating a non-member element, adding an edge whose
//! ends are not members) are programming errors caught by debug assertions,
//! not values of this type. `GraphError` is what the invariant validators
//! report when a structure has been corrupted, and what the few fallible
//! public APIs return.

use thiserror::Error;

/// Unified error type for graph-views operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A graph id does not name a live graph of the hierarchy.
    #[error("graph id {0} does not name a live graph")]
    UnknownGraph(u32),
    /// An indexed set's position table disagrees with its element vector.
    #[error("indexed set out of sync: slot {slot} holds element {found} but its position entry is {mapped}")]
    PositionMismatch { slot: usize, found: u32, mapped: u32 },
    /// An id is recorded in a free pool more than once.
    #[error("id {0} is recorded as free more than once")]
    DuplicateFreeId(u32),
    /// An id is simultaneously live and free.
    #[error("id {0} is both a member and recorded as free")]
    FreeIdAlive(u32),
    /// A view contains an edge but not one of its current endpoints.
    #[error("graph {graph} contains edge {edge} but not its endpoint node {node}")]
    DanglingEdge { graph: u32, edge: u32, node: u32 },
    /// A view's membership is not a subset of its parent's.
    #[error("graph {graph} contains element {elt} that its parent does not")]
    NotSubsetOfParent { graph: u32, elt: u32 },
    /// A node's out-degree counter disagrees with its incidence list.
    #[error("node {node} in graph {graph}: incidence holds {len} entries but out-degree is {out}")]
    DegreeMismatch {
        graph: u32,
        node: u32,
        len: usize,
        out: u32,
    },
    /// An edge is a member of a view but missing from an endpoint's incidence.
    #[error("edge {edge} is missing from the incidence of node {node} in graph {graph}")]
    MissingIncidence { graph: u32, edge: u32, node: u32 },
}
