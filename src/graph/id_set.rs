//! Position-indexed element sets.
//!
//! Two containers share one contract: a vector of member ids plus an O(1)
//! reverse index from id to position. [`DenseIdSet`] backs the root graph,
//! where membership is dense over a compact id range and the set itself
//! mints ids (recycling freed ones through a FIFO queue). [`SparseIdSet`]
//! backs subgraph views, whose membership is a small arbitrary subset of a
//! much larger id universe, so the reverse index is a hash map and ids are
//! always supplied by the caller.
//!
//! Removal swap-deletes: the removed element is exchanged with the last one,
//! the swapped element's position is fixed, and the vector shrinks — O(1)
//! amortized, insertion order not preserved.

use std::collections::VecDeque;

use crate::debug_invariants::DebugInvariants;
use crate::graph::element::IdLike;
use crate::graph_error::GraphError;

pub(crate) const POS_NONE: u32 = u32::MAX;

/// Shared contract of [`DenseIdSet`] and [`SparseIdSet`].
pub trait IndexedSet<T: IdLike> {
    /// Whether `elt` is currently a member. O(1).
    fn is_element(&self, elt: T) -> bool;
    /// Position of `elt` in the element vector, `None` if not a member.
    fn get_pos(&self, elt: T) -> Option<usize>;
    /// Number of members.
    fn len(&self) -> usize;
    /// Whether the set has no members.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// The members, in current (mutation-dependent) order.
    fn as_slice(&self) -> &[T];
    /// Swap-deletes `elt`. Contract: `elt` must be a member.
    fn remove(&mut self, elt: T);
    /// Ascending sort of the element order, recomputing all positions.
    fn sort(&mut self);
}

/// Vector-backed set that mints its own ids, used by the root graph.
#[derive(Clone, Debug, Default)]
pub struct DenseIdSet<T> {
    elements: Vec<T>,
    // id -> position, POS_NONE for non-members
    pos: Vec<u32>,
    // freed ids, recycled front-first
    free_ids: VecDeque<T>,
}

impl<T: IdLike> DenseIdSet<T> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            pos: Vec::new(),
            free_ids: VecDeque::new(),
        }
    }

    /// Drops every member and forgets the free queue.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.pos.clear();
        self.free_ids.clear();
    }

    /// Reserves room for `nb` members.
    pub fn reserve(&mut self, nb: usize) {
        self.elements.reserve(nb);
        self.pos.reserve(nb);
    }

    /// Whether freed ids are waiting to be recycled.
    pub fn has_free(&self) -> bool {
        !self.free_ids.is_empty()
    }

    /// Number of freed ids waiting to be recycled.
    pub fn number_of_free(&self) -> usize {
        self.free_ids.len()
    }

    /// Mints a new member, reusing a previously freed id if one exists.
    ///
    /// Fresh ids come from the position-table high-water mark, not the
    /// member count: a [`restore`](Self::restore) may have re-seated a high
    /// id while lower ones stay retired, and minting below it would
    /// re-issue a live id.
    pub fn add(&mut self) -> T {
        let cur = self.elements.len();
        let elt = match self.free_ids.pop_front() {
            Some(elt) => elt,
            None => {
                let next = self.pos.len();
                self.pos.push(POS_NONE);
                T::from_index(next)
            }
        };
        self.elements.push(elt);
        self.pos[elt.index()] = cur as u32;
        elt
    }

    /// Mints `nb` new members at once and returns them.
    pub fn add_n(&mut self, nb: usize) -> Vec<T> {
        let last = self.elements.len();
        for _ in 0..nb {
            let elt = match self.free_ids.pop_front() {
                Some(elt) => elt,
                None => {
                    let next = self.pos.len();
                    self.pos.push(POS_NONE);
                    T::from_index(next)
                }
            };
            self.elements.push(elt);
        }
        for i in 0..nb {
            let elt = self.elements[last + i];
            self.pos[elt.index()] = (last + i) as u32;
        }
        self.elements[last..].to_vec()
    }

    /// Re-inserts a *specific* previously freed id.
    ///
    /// This is the id-preserving seam consumed by undo/redo replay.
    /// Contract: `elt` must not currently be a member.
    pub fn restore(&mut self, elt: T) {
        if let Some(i) = self.free_ids.iter().position(|&f| f == elt) {
            self.free_ids.remove(i);
        } else {
            debug_assert!(!self.is_element(elt), "restore of a live element {elt:?}");
        }
        let cur = self.elements.len();
        if self.pos.len() <= elt.index() {
            self.pos.resize(elt.index() + 1, POS_NONE);
        }
        self.elements.push(elt);
        self.pos[elt.index()] = cur as u32;
    }

    /// Exchanges the positions of two members.
    pub fn swap_elements(&mut self, a: T, b: T) {
        debug_assert!(self.is_element(a));
        debug_assert!(self.is_element(b));
        let pa = self.pos[a.index()] as usize;
        let pb = self.pos[b.index()] as usize;
        self.elements.swap(pa, pb);
        self.pos.swap(a.index(), b.index());
    }

    /// Iterator over the members.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.elements.iter().copied()
    }
}

impl<T: IdLike> IndexedSet<T> for DenseIdSet<T> {
    #[inline]
    fn is_element(&self, elt: T) -> bool {
        elt.is_valid()
            && elt.index() < self.pos.len()
            && self.pos[elt.index()] != POS_NONE
    }

    #[inline]
    fn get_pos(&self, elt: T) -> Option<usize> {
        if self.is_element(elt) {
            Some(self.pos[elt.index()] as usize)
        } else {
            None
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        &self.elements
    }

    fn remove(&mut self, elt: T) {
        debug_assert!(self.is_element(elt));
        let cur = self.pos[elt.index()] as usize;
        let last = self.elements.len() - 1;
        if cur != last {
            self.elements.swap(cur, last);
            self.pos[self.elements[cur].index()] = cur as u32;
        }
        self.free_ids.push_back(elt);
        self.elements.pop();
        self.pos[elt.index()] = POS_NONE;
        if self.elements.is_empty() {
            // all members are gone, nothing left to recycle against
            self.free_ids.clear();
            self.pos.clear();
        }
    }

    fn sort(&mut self) {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            self.elements.par_sort_unstable();
        }
        #[cfg(not(feature = "rayon"))]
        self.elements.sort_unstable();
        for (i, elt) in self.elements.iter().enumerate() {
            self.pos[elt.index()] = i as u32;
        }
    }
}

impl<T: IdLike> DebugInvariants for DenseIdSet<T> {
    fn debug_assert_invariants(&self) {
        crate::graph_debug_assert_ok!(self.validate_invariants(), "DenseIdSet invalid");
    }

    fn validate_invariants(&self) -> Result<(), GraphError> {
        for (i, elt) in self.elements.iter().enumerate() {
            let mapped = self
                .pos
                .get(elt.index())
                .copied()
                .unwrap_or(POS_NONE);
            if mapped as usize != i {
                return Err(GraphError::PositionMismatch {
                    slot: i,
                    found: elt.index() as u32,
                    mapped,
                });
            }
        }
        let mut seen = hashbrown::HashSet::new();
        for &f in &self.free_ids {
            if !seen.insert(f) {
                return Err(GraphError::DuplicateFreeId(f.index() as u32));
            }
            if self.is_element(f) {
                return Err(GraphError::FreeIdAlive(f.index() as u32));
            }
        }
        Ok(())
    }
}

/// Hash-indexed set for sparse membership, used by subgraph views.
#[derive(Clone, Debug, Default)]
pub struct SparseIdSet<T: IdLike> {
    elements: Vec<T>,
    pos: hashbrown::HashMap<T, u32>,
}

impl<T: IdLike> SparseIdSet<T> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            pos: hashbrown::HashMap::new(),
        }
    }

    /// Reserves room for `nb` members.
    pub fn reserve(&mut self, nb: usize) {
        self.elements.reserve(nb);
        self.pos.reserve(nb);
    }

    /// Appends `elt`. Contract: `elt` must not already be a member.
    pub fn add(&mut self, elt: T) {
        debug_assert!(!self.is_element(elt));
        self.pos.insert(elt, self.elements.len() as u32);
        self.elements.push(elt);
    }

    /// Replaces the whole membership by `elts`.
    pub fn clone_from_slice(&mut self, elts: &[T]) {
        self.elements = elts.to_vec();
        self.pos.clear();
        for (i, &elt) in elts.iter().enumerate() {
            self.pos.insert(elt, i as u32);
        }
    }

    /// Iterator over the members.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.elements.iter().copied()
    }
}

impl<T: IdLike> IndexedSet<T> for SparseIdSet<T> {
    #[inline]
    fn is_element(&self, elt: T) -> bool {
        self.pos.contains_key(&elt)
    }

    #[inline]
    fn get_pos(&self, elt: T) -> Option<usize> {
        self.pos.get(&elt).map(|&p| p as usize)
    }

    #[inline]
    fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        &self.elements
    }

    fn remove(&mut self, elt: T) {
        let cur = match self.pos.remove(&elt) {
            Some(p) => p as usize,
            None => {
                debug_assert!(false, "remove of a non-member {elt:?}");
                return;
            }
        };
        let last = self.elements.len() - 1;
        if cur < last {
            let moved = self.elements[last];
            self.elements[cur] = moved;
            self.pos.insert(moved, cur as u32);
        }
        self.elements.truncate(last);
    }

    fn sort(&mut self) {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            self.elements.par_sort_unstable();
        }
        #[cfg(not(feature = "rayon"))]
        self.elements.sort_unstable();
        for (i, &elt) in self.elements.iter().enumerate() {
            self.pos.insert(elt, i as u32);
        }
    }
}

impl<T: IdLike> DebugInvariants for SparseIdSet<T> {
    fn debug_assert_invariants(&self) {
        crate::graph_debug_assert_ok!(self.validate_invariants(), "SparseIdSet invalid");
    }

    fn validate_invariants(&self) -> Result<(), GraphError> {
        if self.pos.len() != self.elements.len() {
            return Err(GraphError::PositionMismatch {
                slot: self.elements.len(),
                found: u32::MAX,
                mapped: self.pos.len() as u32,
            });
        }
        for (i, elt) in self.elements.iter().enumerate() {
            let mapped = self.pos.get(elt).copied().unwrap_or(POS_NONE);
            if mapped as usize != i {
                return Err(GraphError::PositionMismatch {
                    slot: i,
                    found: elt.index() as u32,
                    mapped,
                });
            }
        }
        Ok(())
    }
}
