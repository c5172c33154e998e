//! Root-graph element storage.
//!
//! Holds the canonical node and edge sets of a hierarchy together with the
//! single source of truth for edge endpoints and per-node incidence. Views
//! never duplicate endpoint data; they filter what lives here.

use crate::debug_invariants::DebugInvariants;
use crate::graph::element::{EdgeId, IdLike, NodeId};
use crate::graph::id_set::{DenseIdSet, IndexedSet};
use crate::graph::incidence::IncidenceRecord;
use crate::graph_error::GraphError;

/// Saved node/edge id state, taken before a batch of speculative edits.
#[derive(Clone, Debug)]
pub struct IdsSnapshot {
    nodes: DenseIdSet<NodeId>,
    edges: DenseIdSet<EdgeId>,
}

#[derive(Clone, Debug, Default)]
pub struct GraphStorage {
    nodes: DenseIdSet<NodeId>,
    edges: DenseIdSet<EdgeId>,
    // indexed by node id, slots outlive deletions for O(1) reuse
    node_data: Vec<IncidenceRecord>,
    // indexed by edge id, (source, target)
    edge_ends: Vec<(NodeId, NodeId)>,
}

impl GraphStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_node_element(&self, n: NodeId) -> bool {
        self.nodes.is_element(n)
    }

    #[inline]
    pub fn is_edge_element(&self, e: EdgeId) -> bool {
        self.edges.is_element(e)
    }

    #[inline]
    pub fn nodes(&self) -> &[NodeId] {
        self.nodes.as_slice()
    }

    #[inline]
    pub fn edges(&self) -> &[EdgeId] {
        self.edges.as_slice()
    }

    pub fn reserve_nodes(&mut self, nb: usize) {
        self.nodes.reserve(nb);
        self.node_data.reserve(nb);
    }

    pub fn reserve_edges(&mut self, nb: usize) {
        self.edges.reserve(nb);
        self.edge_ends.reserve(nb);
    }

    /// Mints a fresh isolated node.
    pub fn add_node(&mut self) -> NodeId {
        let n = self.nodes.add();
        self.ensure_node_slot(n);
        n
    }

    /// Mints `nb` fresh isolated nodes.
    pub fn add_nodes(&mut self, nb: usize) -> Vec<NodeId> {
        let added = self.nodes.add_n(nb);
        for &n in &added {
            self.ensure_node_slot(n);
        }
        added
    }

    /// Re-creates a previously deleted node under its old id.
    pub fn restore_node(&mut self, n: NodeId) {
        self.nodes.restore(n);
        self.ensure_node_slot(n);
    }

    /// Mints a fresh edge from `src` to `tgt`. Self-loops allowed.
    pub fn add_edge(&mut self, src: NodeId, tgt: NodeId) -> EdgeId {
        debug_assert!(self.is_node_element(src));
        debug_assert!(self.is_node_element(tgt));
        let e = self.edges.add();
        self.ensure_edge_slot(e);
        self.edge_ends[e.index()] = (src, tgt);
        self.node_data[src.index()].push_out(e);
        self.node_data[tgt.index()].push_in(e);
        e
    }

    /// Re-creates a previously deleted edge under its old id, re-attaching
    /// it to both endpoints.
    pub fn restore_edge(&mut self, e: EdgeId, src: NodeId, tgt: NodeId) {
        debug_assert!(self.is_node_element(src));
        debug_assert!(self.is_node_element(tgt));
        self.edges.restore(e);
        self.ensure_edge_slot(e);
        self.edge_ends[e.index()] = (src, tgt);
        self.node_data[src.index()].push_out(e);
        self.node_data[tgt.index()].push_in(e);
    }

    /// Mints one edge per `(src, tgt)` pair.
    pub fn add_edges(&mut self, ends: &[(NodeId, NodeId)]) -> Vec<EdgeId> {
        self.reserve_edges(ends.len());
        ends.iter().map(|&(s, t)| self.add_edge(s, t)).collect()
    }

    /// Detaches and frees `e`. Contract: `e` must exist.
    pub fn del_edge(&mut self, e: EdgeId) {
        debug_assert!(self.is_edge_element(e));
        let (src, tgt) = self.edge_ends[e.index()];
        self.node_data[src.index()].remove(e);
        if tgt != src {
            self.node_data[tgt.index()].remove(e);
        }
        self.edges.remove(e);
    }

    /// Frees `n` along with whatever edges are still attached to it.
    /// A self-loop is deleted once even though it occurs twice in the
    /// incidence.
    pub fn del_node(&mut self, n: NodeId) {
        debug_assert!(self.is_node_element(n));
        let mut incident: Vec<EdgeId> = Vec::new();
        for &e in self.node_data[n.index()].edges() {
            if !incident.contains(&e) {
                incident.push(e);
            }
        }
        for e in incident {
            self.del_edge(e);
        }
        self.node_data[n.index()].clear();
        self.nodes.remove(n);
    }

    /// Deletes every edge, keeping the nodes.
    pub fn del_all_edges(&mut self) {
        for rec in &mut self.node_data {
            rec.clear();
        }
        self.edges.clear();
    }

    /// Deletes everything.
    pub fn clear(&mut self) {
        self.del_all_edges();
        self.node_data.clear();
        self.edge_ends.clear();
        self.nodes.clear();
    }

    /// `(source, target)` of `e`.
    #[inline]
    pub fn ends(&self, e: EdgeId) -> (NodeId, NodeId) {
        debug_assert!(self.is_edge_element(e));
        self.edge_ends[e.index()]
    }

    #[inline]
    pub fn source(&self, e: EdgeId) -> NodeId {
        self.ends(e).0
    }

    #[inline]
    pub fn target(&self, e: EdgeId) -> NodeId {
        self.ends(e).1
    }

    /// Given one endpoint, the other. Self-loop: returns `n` itself.
    #[inline]
    pub fn opposite(&self, e: EdgeId, n: NodeId) -> NodeId {
        let (src, tgt) = self.ends(e);
        debug_assert!(n == src || n == tgt);
        if src == n { tgt } else { src }
    }

    /// Rebinds the endpoints of `e`. An invalid id keeps the current
    /// endpoint on that side. Returns the previous `(source, target)`.
    pub fn set_ends(&mut self, e: EdgeId, src: NodeId, tgt: NodeId) -> (NodeId, NodeId) {
        debug_assert!(self.is_edge_element(e));
        let old = self.edge_ends[e.index()];
        let new_src = if src.is_valid() { src } else { old.0 };
        let new_tgt = if tgt.is_valid() { tgt } else { old.1 };
        if (new_src, new_tgt) == old {
            return old;
        }
        debug_assert!(self.is_node_element(new_src));
        debug_assert!(self.is_node_element(new_tgt));
        // drop both incidence entries, then re-attach; remove() clears the
        // doubled self-loop entries in one call
        self.node_data[old.0.index()].remove(e);
        if old.1 != old.0 {
            self.node_data[old.1.index()].remove(e);
        }
        self.edge_ends[e.index()] = (new_src, new_tgt);
        self.node_data[new_src.index()].push_out(e);
        self.node_data[new_tgt.index()].push_in(e);
        old
    }

    /// Swaps source and target of `e` in place.
    pub fn reverse(&mut self, e: EdgeId) {
        debug_assert!(self.is_edge_element(e));
        let (src, tgt) = self.edge_ends[e.index()];
        self.edge_ends[e.index()] = (tgt, src);
        if src == tgt {
            return;
        }
        self.node_data[src.index()].make_in(e);
        self.node_data[tgt.index()].make_out(e);
    }

    /// All edges incident to `n`, out-edges first, self-loops twice.
    #[inline]
    pub fn incidence(&self, n: NodeId) -> &IncidenceRecord {
        debug_assert!(self.is_node_element(n));
        &self.node_data[n.index()]
    }

    #[inline]
    pub fn degree(&self, n: NodeId) -> usize {
        self.incidence(n).degree()
    }

    #[inline]
    pub fn out_degree(&self, n: NodeId) -> usize {
        self.incidence(n).out_degree()
    }

    #[inline]
    pub fn in_degree(&self, n: NodeId) -> usize {
        self.incidence(n).in_degree()
    }

    /// First edge from `src` to `tgt` (or between them when `directed`
    /// is false).
    pub fn edge_between(&self, src: NodeId, tgt: NodeId, directed: bool) -> Option<EdgeId> {
        self.edges_between(src, tgt, directed).into_iter().next()
    }

    /// All edges from `src` to `tgt`, in incidence order. With `directed`
    /// false, edges in either direction qualify; a self-loop (when
    /// `src == tgt`) is reported once despite its doubled incidence entry.
    pub fn edges_between(&self, src: NodeId, tgt: NodeId, directed: bool) -> Vec<EdgeId> {
        let mut found = Vec::new();
        if !self.is_node_element(src) || !self.is_node_element(tgt) {
            return found;
        }
        for &e in self.incidence(src).edges() {
            let (s, t) = self.ends(e);
            let hit = (s == src && t == tgt) || (!directed && s == tgt && t == src);
            if hit && !found.contains(&e) {
                found.push(e);
            }
        }
        found
    }

    /// Position of `n` in the root node order.
    #[inline]
    pub fn node_pos(&self, n: NodeId) -> Option<usize> {
        self.nodes.get_pos(n)
    }

    /// Position of `e` in the root edge order.
    #[inline]
    pub fn edge_pos(&self, e: EdgeId) -> Option<usize> {
        self.edges.get_pos(e)
    }

    /// Rewrites the incidence order of `n` to follow `order`.
    pub fn set_edge_order(&mut self, n: NodeId, order: &[EdgeId]) {
        debug_assert!(self.is_node_element(n));
        self.node_data[n.index()].set_order(order);
    }

    /// Exchanges two edges in the incidence order of `n`.
    pub fn swap_edge_order(&mut self, n: NodeId, e1: EdgeId, e2: EdgeId) {
        debug_assert!(self.is_node_element(n));
        self.node_data[n.index()].swap_edge_order(e1, e2);
    }

    /// Ascending sort of both element orders.
    pub fn sort_elements(&mut self) {
        self.nodes.sort();
        self.edges.sort();
    }

    /// Value snapshot of the id state, for O(elements) rollback.
    pub fn ids_snapshot(&self) -> IdsSnapshot {
        IdsSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Restores a snapshot taken by [`ids_snapshot`](Self::ids_snapshot).
    /// Incidence and endpoint data are untouched; the caller replays those
    /// through restore operations.
    pub fn restore_ids_snapshot(&mut self, snapshot: IdsSnapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
    }

    fn ensure_node_slot(&mut self, n: NodeId) {
        if self.node_data.len() <= n.index() {
            self.node_data.resize_with(n.index() + 1, IncidenceRecord::new);
        }
    }

    fn ensure_edge_slot(&mut self, e: EdgeId) {
        if self.edge_ends.len() <= e.index() {
            self.edge_ends
                .resize(e.index() + 1, (NodeId::INVALID, NodeId::INVALID));
        }
    }
}

impl DebugInvariants for GraphStorage {
    fn debug_assert_invariants(&self) {
        crate::graph_debug_assert_ok!(self.validate_invariants(), "GraphStorage invalid");
    }

    fn validate_invariants(&self) -> Result<(), GraphError> {
        let root = crate::graph::element::GraphId::ROOT.get();
        for &e in self.edges.as_slice() {
            let (src, tgt) = self.edge_ends[e.index()];
            for n in [src, tgt] {
                if !self.is_node_element(n) {
                    return Err(GraphError::DanglingEdge {
                        graph: root,
                        edge: e.get(),
                        node: n.get(),
                    });
                }
                if !self.node_data[n.index()].edges().contains(&e) {
                    return Err(GraphError::MissingIncidence {
                        graph: root,
                        edge: e.get(),
                        node: n.get(),
                    });
                }
            }
        }
        for &n in self.nodes.as_slice() {
            let rec = &self.node_data[n.index()];
            let out = rec.edges()[..rec.out_degree()]
                .iter()
                .all(|&e| self.is_edge_element(e) && self.source(e) == n);
            let inn = rec.edges()[rec.out_degree()..]
                .iter()
                .all(|&e| self.is_edge_element(e) && self.target(e) == n);
            if !(out && inn) {
                return Err(GraphError::DegreeMismatch {
                    graph: root,
                    node: n.get(),
                    len: rec.degree(),
                    out: rec.out_degree() as u32,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (GraphStorage, Vec<NodeId>, Vec<EdgeId>) {
        let mut st = GraphStorage::new();
        let ns = st.add_nodes(3);
        let es = vec![
            st.add_edge(ns[0], ns[1]),
            st.add_edge(ns[1], ns[2]),
            st.add_edge(ns[2], ns[0]),
        ];
        (st, ns, es)
    }

    #[test]
    fn add_edge_wires_both_endpoints() {
        let (st, ns, es) = triangle();
        assert_eq!(st.ends(es[0]), (ns[0], ns[1]));
        assert_eq!(st.out_degree(ns[0]), 1);
        assert_eq!(st.in_degree(ns[0]), 1);
        assert_eq!(st.degree(ns[1]), 2);
        st.debug_assert_invariants();
    }

    #[test]
    fn self_loop_counts_twice() {
        let mut st = GraphStorage::new();
        let n = st.add_node();
        let e = st.add_edge(n, n);
        assert_eq!(st.degree(n), 2);
        assert_eq!(st.out_degree(n), 1);
        assert_eq!(st.in_degree(n), 1);
        st.del_edge(e);
        assert_eq!(st.degree(n), 0);
        st.debug_assert_invariants();
    }

    #[test]
    fn del_edge_detaches_and_recycles() {
        let (mut st, ns, es) = triangle();
        st.del_edge(es[0]);
        assert!(!st.is_edge_element(es[0]));
        assert_eq!(st.degree(ns[0]), 1);
        assert_eq!(st.degree(ns[1]), 1);
        // freed id is minted again
        let e = st.add_edge(ns[0], ns[2]);
        assert_eq!(e, es[0]);
        st.debug_assert_invariants();
    }

    #[test]
    fn set_ends_keeps_sides_marked_invalid() {
        let (mut st, ns, es) = triangle();
        let old = st.set_ends(es[0], NodeId::INVALID, ns[2]);
        assert_eq!(old, (ns[0], ns[1]));
        assert_eq!(st.ends(es[0]), (ns[0], ns[2]));
        assert_eq!(st.out_degree(ns[0]), 1);
        assert_eq!(st.in_degree(ns[1]), 0);
        assert_eq!(st.degree(ns[2]), 3);
        st.debug_assert_invariants();
    }

    #[test]
    fn set_ends_into_a_self_loop_and_back() {
        let mut st = GraphStorage::new();
        let ns = st.add_nodes(2);
        let e = st.add_edge(ns[0], ns[1]);
        st.set_ends(e, ns[0], ns[0]);
        assert_eq!(st.degree(ns[0]), 2);
        assert_eq!(st.degree(ns[1]), 0);
        st.set_ends(e, ns[1], ns[0]);
        assert_eq!(st.ends(e), (ns[1], ns[0]));
        assert_eq!(st.degree(ns[0]), 1);
        assert_eq!(st.out_degree(ns[1]), 1);
        st.debug_assert_invariants();
    }

    #[test]
    fn reverse_swaps_regions() {
        let (mut st, ns, es) = triangle();
        st.reverse(es[0]);
        assert_eq!(st.ends(es[0]), (ns[1], ns[0]));
        assert_eq!(st.out_degree(ns[1]), 2);
        assert_eq!(st.out_degree(ns[0]), 0);
        st.debug_assert_invariants();
    }

    #[test]
    fn restore_rebuilds_under_old_ids() {
        let (mut st, ns, es) = triangle();
        st.del_edge(es[1]);
        st.restore_edge(es[1], ns[1], ns[2]);
        assert_eq!(st.ends(es[1]), (ns[1], ns[2]));
        assert_eq!(st.out_degree(ns[1]), 1);
        st.debug_assert_invariants();
    }

    #[test]
    fn edge_between_respects_direction() {
        let (st, ns, es) = triangle();
        assert_eq!(st.edge_between(ns[0], ns[1], true), Some(es[0]));
        assert_eq!(st.edge_between(ns[1], ns[0], true), None);
        assert_eq!(st.edge_between(ns[1], ns[0], false), Some(es[0]));
    }

    #[test]
    fn edges_between_reports_a_self_loop_once() {
        let mut st = GraphStorage::new();
        let n = st.add_node();
        let e = st.add_edge(n, n);
        assert_eq!(st.edges_between(n, n, true), vec![e]);
        assert_eq!(st.edges_between(n, n, false), vec![e]);
    }

    #[test]
    fn del_node_takes_incident_edges_with_it() {
        let (mut st, ns, _es) = triangle();
        st.del_node(ns[0]);
        assert!(!st.is_node_element(ns[0]));
        assert_eq!(st.number_of_nodes(), 2);
        assert_eq!(st.number_of_edges(), 1);
        assert_eq!(st.degree(ns[1]), 1);
        st.debug_assert_invariants();
    }

    #[test]
    fn del_node_handles_a_self_loop_once() {
        let mut st = GraphStorage::new();
        let n = st.add_node();
        st.add_edge(n, n);
        st.del_node(n);
        assert_eq!(st.number_of_nodes(), 0);
        assert_eq!(st.number_of_edges(), 0);
    }

    #[test]
    fn ids_snapshot_rolls_back_minting() {
        let (mut st, ns, es) = triangle();
        let snap = st.ids_snapshot();
        let extra = st.add_node();
        let e = st.add_edge(extra, ns[0]);
        st.del_edge(e);
        st.restore_ids_snapshot(snap);
        assert!(!st.is_node_element(extra));
        assert_eq!(st.number_of_nodes(), 3);
        assert_eq!(st.number_of_edges(), 3);
        assert!(st.is_edge_element(es[2]));
    }

    #[test]
    fn sort_elements_orders_both_sets() {
        let (mut st, ns, es) = triangle();
        st.del_edge(es[0]);
        st.restore_edge(es[0], ns[0], ns[1]);
        st.sort_elements();
        assert_eq!(st.edges(), &[es[0], es[1], es[2]]);
        assert_eq!(st.edge_pos(es[0]), Some(0));
    }
}
