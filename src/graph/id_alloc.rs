//! Allocation and recycling of the small dense integers identifying a root
//! graph's elements and the graphs of a hierarchy.
//!
//! The allocator keeps the live id span `[first_id, next_id)` as compact as
//! possible because several arrays elsewhere are sized by the maximum live
//! id. `get` therefore consumes ids from the low end first: it prefers
//! re-extending the contiguous freed block below `first_id`, then the lowest
//! entry of the free set, and only then grows `next_id`.
//!
//! The whole state is a value type that can be snapshotted and restored in
//! O(1); this is the seam used by transactional undo/redo.

use std::collections::BTreeSet;
use std::fmt;

/// Snapshot of an [`IdAllocator`].
///
/// Invariant: every id in `[first_id, next_id)` is either in use or present
/// in `free_ids` exactly once; ids below `first_id` are free.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdAllocatorState {
    /// The first id in use.
    pub first_id: u32,
    /// The next id to mint.
    pub next_id: u32,
    /// The unused ids between the first and the next.
    pub free_ids: BTreeSet<u32>,
}

/// Allocator of dense element/graph ids with low-end-first recycling.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    state: IdAllocatorState,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an id not currently in use.
    ///
    /// Policy: decrement `first_id` if possible (cheapest reuse, keeps the
    /// live span compact), else pop the minimum of the free set, else grow
    /// `next_id`.
    pub fn get(&mut self) -> u32 {
        let s = &mut self.state;
        if s.first_id > 0 {
            s.first_id -= 1;
            s.first_id
        } else if let Some(&id) = s.free_ids.iter().next() {
            s.free_ids.remove(&id);
            id
        } else {
            let id = s.next_id;
            s.next_id += 1;
            id
        }
    }

    /// Whether `id` is not currently in use.
    pub fn is_free(&self, id: u32) -> bool {
        id < self.state.first_id || id >= self.state.next_id || self.state.free_ids.contains(&id)
    }

    /// Marks `id` reusable. Freeing an id that is already free is a no-op.
    pub fn free(&mut self, id: u32) {
        let s = &mut self.state;
        if id < s.first_id
            || id >= s.next_id
            || s.free_ids.contains(&id)
            || s.first_id == s.next_id
        {
            return;
        }
        if id == s.first_id {
            // re-extend the contiguous free block at the low end
            s.first_id += 1;
            while s.free_ids.remove(&s.first_id) {
                s.first_id += 1;
            }
            if s.first_id == s.next_id {
                // every id is free again, forget them all
                s.first_id = 0;
                s.next_id = 0;
            }
        } else {
            s.free_ids.insert(id);
        }
    }

    /// Removes and returns the lowest id of the free set.
    ///
    /// Contract: the free set must not be empty.
    pub fn lowest_free(&mut self) -> u32 {
        let id = *self
            .state
            .free_ids
            .iter()
            .next()
            .expect("lowest_free called with an empty free set");
        self.state.free_ids.remove(&id);
        id
    }

    /// Reserves a *specific* free id, marking it occupied.
    ///
    /// Used to reassign the exact id an element had before (replaying
    /// history, loading a hierarchy). Contract: `id` must be free and not
    /// below the compacted low end.
    pub fn mark_used(&mut self, id: u32) {
        let s = &mut self.state;
        debug_assert!(
            id >= s.first_id,
            "cannot reserve id {id} below the compacted low end {}",
            s.first_id
        );
        if id >= s.next_id {
            if s.first_id == s.next_id {
                s.first_id = id;
            } else {
                for skipped in s.next_id..id {
                    s.free_ids.insert(skipped);
                }
            }
            s.next_id = id + 1;
        } else {
            let was_free = s.free_ids.remove(&id);
            debug_assert!(was_free, "id {id} is not free");
        }
    }

    /// The current state; cloning it is the O(1) snapshot used by undo.
    pub fn state(&self) -> &IdAllocatorState {
        &self.state
    }

    /// Rolls the allocator back to a prior snapshot.
    pub fn restore_state(&mut self, state: IdAllocatorState) {
        self.state = state;
    }

    /// Lazy ascending iterator over the ids currently in use.
    ///
    /// The iterator borrows the allocator, so the borrow checker rules out
    /// the invalidation hazard of interleaving `get`/`free` calls with the
    /// traversal; there is no snapshot isolation.
    pub fn used_ids(&self) -> impl Iterator<Item = u32> + '_ {
        (self.state.first_id..self.state.next_id)
            .filter(move |id| !self.state.free_ids.contains(id))
    }
}

impl fmt::Display for IdAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id allocator:")?;
        writeln!(f, "  minimum index: {}", self.state.first_id)?;
        match self.state.next_id {
            0 => writeln!(f, "  maximum index: -")?,
            next => writeln!(f, "  maximum index: {}", next - 1)?,
        }
        writeln!(f, "  free count   : {}", self.state.free_ids.len())?;
        write!(
            f,
            "  fragmentation: {}",
            self.state.free_ids.len() as f64
                / (1 + self.state.next_id - self.state.first_id) as f64
        )
    }
}
