//! Strong, zero-cost handles for graph elements.
//!
//! Nodes, edges and graphs are identified by small dense integers minted by
//! the root graph. Each id family wraps a `u32` whose maximum value is
//! reserved as the "invalid" sentinel, so a handle fits in one machine word
//! and can index directly into the dense arrays the root sizes by max live id.
//!
//! This module provides:
//! - `NodeId`, `EdgeId` and `GraphId` transparent newtypes with layout
//!   guarantees.
//! - The [`IdLike`] trait abstracting the id families for the indexed-set
//!   containers.
//! - Common trait implementations (`Debug`, `Display`, ordering, hashing,
//!   serde) so ids can be used in maps, sets, and printed easily.

use std::fmt;

/// Abstraction over the id families stored in the indexed-set containers.
///
/// An `IdLike` value is a plain index with an invalid sentinel; it has no
/// ownership semantics.
pub trait IdLike: Copy + Eq + Ord + std::hash::Hash + fmt::Debug {
    /// The invalid sentinel of this family.
    const INVALID: Self;
    /// Build an id from a dense index.
    fn from_index(index: usize) -> Self;
    /// The dense index of this id.
    fn index(self) -> usize;
    /// Whether this id is not the invalid sentinel.
    fn is_valid(self) -> bool;
}

macro_rules! impl_id_like {
    ($ty:ident) => {
        impl IdLike for $ty {
            const INVALID: Self = $ty::INVALID;
            #[inline]
            fn from_index(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize);
                $ty(index as u32)
            }
            #[inline]
            fn index(self) -> usize {
                debug_assert!(self.is_valid());
                self.0 as usize
            }
            #[inline]
            fn is_valid(self) -> bool {
                $ty::is_valid(self)
            }
        }
    };
}

/// Identifier of a node of a root graph and of every view sharing its
/// topology.
///
/// # Memory layout
/// `repr(transparent)`: same ABI and alignment as a `u32`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The invalid node, returned by lookups that found nothing.
    pub const INVALID: NodeId = NodeId(u32::MAX);

    /// Creates a `NodeId` from a raw `u32` value.
    ///
    /// `u32::MAX` is reserved as the invalid sentinel; passing it yields
    /// [`NodeId::INVALID`].
    #[inline]
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    /// Returns the inner `u32` value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this id is not the invalid sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::INVALID
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeId").field(&self.0).finish()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl_id_like!(NodeId);

/// Identifier of an edge. Edge ids form a family independent from node ids.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct EdgeId(u32);

impl EdgeId {
    /// The invalid edge, returned e.g. by `exist_edge` when no edge matches.
    pub const INVALID: EdgeId = EdgeId(u32::MAX);

    /// Creates an `EdgeId` from a raw `u32` value.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        EdgeId(raw)
    }

    /// Returns the inner `u32` value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this id is not the invalid sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        EdgeId::INVALID
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EdgeId").field(&self.0).finish()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl_id_like!(EdgeId);

/// Identifier of a graph of a hierarchy. The root graph is always
/// [`GraphId::ROOT`].
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct GraphId(u32);

impl GraphId {
    /// The root graph of every hierarchy.
    pub const ROOT: GraphId = GraphId(0);
    /// The invalid graph.
    pub const INVALID: GraphId = GraphId(u32::MAX);

    /// Creates a `GraphId` from a raw `u32` value.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        GraphId(raw)
    }

    /// Returns the inner `u32` value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this id is not the invalid sentinel.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    /// Whether this id names the root graph.
    #[inline]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GraphId").field(&self.0).finish()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl_id_like!(GraphId);

#[cfg(test)]
mod layout_tests {
    //! Compile-time assertions that the id newtypes have the same layout as
    //! `u32`.
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size};

    assert_eq_size!(NodeId, u32);
    assert_eq_size!(EdgeId, u32);
    assert_eq_size!(GraphId, u32);

    #[test]
    fn alignment_matches_u32() {
        assert_eq_align!(NodeId, u32);
        assert_eq_align!(EdgeId, u32);
    }
}


#[cfg(test)]
mod serde_tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let n = NodeId::new(123);
        let s = serde_json::to_string(&n).unwrap();
        let n2: NodeId = serde_json::from_str(&s).unwrap();
        assert_eq!(n2, n);
        let e = EdgeId::new(456);
        let s = serde_json::to_string(&e).unwrap();
        let e2: EdgeId = serde_json::from_str(&s).unwrap();
        assert_eq!(e2, e);
    }
}
