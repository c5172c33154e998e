//! Per-node incidence bookkeeping.

use crate::graph::element::EdgeId;

/// Edges incident to one node, with the out-going prefix count.
///
/// The edge list is kept out-edges-first: every edge whose source is this
/// node sits in `edges[..out_degree]`, the in-edges after. A self-loop is
/// stored twice, once in each region. Swapping an in-edge into the
/// out-region (and bumping the counter) is how edge reversal updates a
/// node in O(degree) without reallocating.
#[derive(Clone, Debug, Default)]
pub struct IncidenceRecord {
    edges: Vec<EdgeId>,
    out_degree: usize,
}

impl IncidenceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn empty() -> Self {
        Self {
            edges: Vec::new(),
            out_degree: 0,
        }
    }

    /// Total degree, self-loops counted twice.
    #[inline]
    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    /// Number of edges leaving this node, self-loops included.
    #[inline]
    pub fn out_degree(&self) -> usize {
        self.out_degree
    }

    /// Number of edges entering this node, self-loops included.
    #[inline]
    pub fn in_degree(&self) -> usize {
        self.edges.len() - self.out_degree
    }

    /// All incident edges, out-edges first.
    #[inline]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Records `e` as leaving this node.
    pub fn push_out(&mut self, e: EdgeId) {
        let out = self.out_degree;
        self.edges.push(e);
        let last = self.edges.len() - 1;
        // keep the out-region a prefix
        self.edges.swap(out, last);
        self.out_degree += 1;
    }

    /// Records `e` as entering this node.
    pub fn push_in(&mut self, e: EdgeId) {
        self.edges.push(e);
    }

    /// Drops every occurrence of `e`, fixing the out-count for those in
    /// the out-region. Handles the doubled self-loop entries in one call.
    pub fn remove(&mut self, e: EdgeId) {
        let mut i = 0;
        while i < self.edges.len() {
            if self.edges[i] == e {
                if i < self.out_degree {
                    self.out_degree -= 1;
                    // close the out-region over the hole
                    self.edges.swap(i, self.out_degree);
                    self.edges.swap_remove(self.out_degree);
                } else {
                    self.edges.swap_remove(i);
                }
            } else {
                i += 1;
            }
        }
    }

    /// Drops the out-region occurrence of `e` only, leaving a doubled
    /// self-loop's in-entry alone. Contract: `e` is an out-edge here.
    pub fn remove_out(&mut self, e: EdgeId) {
        let i = self.edges[..self.out_degree].iter().position(|&x| x == e);
        debug_assert!(i.is_some(), "remove_out of a non-out-edge {e:?}");
        if let Some(i) = i {
            self.out_degree -= 1;
            self.edges.swap(i, self.out_degree);
            self.edges.swap_remove(self.out_degree);
        }
    }

    /// Drops the in-region occurrence of `e` only.
    /// Contract: `e` is an in-edge here.
    pub fn remove_in(&mut self, e: EdgeId) {
        let i = self.edges[self.out_degree..]
            .iter()
            .position(|&x| x == e)
            .map(|p| p + self.out_degree);
        debug_assert!(i.is_some(), "remove_in of a non-in-edge {e:?}");
        if let Some(i) = i {
            self.edges.swap_remove(i);
        }
    }

    /// Moves one occurrence of `e` from the in-region to the out-region.
    /// Contract: `e` is currently an in-edge here.
    pub fn make_out(&mut self, e: EdgeId) {
        let i = self.edges[self.out_degree..]
            .iter()
            .position(|&x| x == e)
            .map(|p| p + self.out_degree);
        debug_assert!(i.is_some(), "make_out of a non-in-edge {e:?}");
        if let Some(i) = i {
            self.edges.swap(i, self.out_degree);
            self.out_degree += 1;
        }
    }

    /// Moves one occurrence of `e` from the out-region to the in-region.
    /// Contract: `e` is currently an out-edge here.
    pub fn make_in(&mut self, e: EdgeId) {
        let i = self.edges[..self.out_degree].iter().position(|&x| x == e);
        debug_assert!(i.is_some(), "make_in of a non-out-edge {e:?}");
        if let Some(i) = i {
            self.out_degree -= 1;
            self.edges.swap(i, self.out_degree);
        }
    }

    /// Exchanges the positions of the first occurrences of `e1` and `e2`.
    /// Order-only: the out-count is untouched, so both edges must sit in
    /// the same region (debug assertion).
    pub fn swap_edge_order(&mut self, e1: EdgeId, e2: EdgeId) {
        if e1 == e2 {
            return;
        }
        let p1 = self.edges.iter().position(|&x| x == e1);
        let p2 = self.edges.iter().position(|&x| x == e2);
        debug_assert!(p1.is_some() && p2.is_some(), "swap of non-incident edges");
        if let (Some(p1), Some(p2)) = (p1, p2) {
            debug_assert_eq!(
                p1 < self.out_degree,
                p2 < self.out_degree,
                "swap across direction regions"
            );
            self.edges.swap(p1, p2);
        }
    }

    /// Rewrites the incidence order to follow `order`, keeping each
    /// occurrence in its direction region. `order` must list exactly the
    /// incident edges (self-loops twice).
    pub fn set_order(&mut self, order: &[EdgeId]) {
        debug_assert_eq!(order.len(), self.edges.len());
        let mut out_left: hashbrown::HashMap<EdgeId, usize> = hashbrown::HashMap::new();
        for &e in &self.edges[..self.out_degree] {
            *out_left.entry(e).or_insert(0) += 1;
        }
        let mut reordered = Vec::with_capacity(self.edges.len());
        let mut tail = Vec::new();
        for &e in order {
            match out_left.get_mut(&e) {
                Some(k) if *k > 0 => {
                    *k -= 1;
                    reordered.push(e);
                }
                _ => tail.push(e),
            }
        }
        debug_assert_eq!(reordered.len(), self.out_degree);
        reordered.extend(tail);
        self.edges = reordered;
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.out_degree = 0;
    }
}
