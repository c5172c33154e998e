//! The subgraph tree and its cascade semantics.
//!
//! A [`GraphHierarchy`] owns one [`GraphStorage`] (the canonical topology)
//! and an arena of graph records indexed by [`GraphId`]. The root record
//! delegates membership to the storage's dense sets; every other record is
//! a *view*: sparse node/edge subsets of its parent plus its own incidence
//! map, so degree queries inside a view see only the view's edges.
//!
//! Mutations go through the hierarchy so membership stays closed under the
//! containment rules: an edge is visible in a view only while both its
//! current endpoints are, and a view's sets are subsets of its parent's.
//! Element creation registers top-down along the ancestor chain; deletion
//! cascades leaves-first through the affected subtree. Every step appends
//! a [`GraphEvent`] to an internal log drained by [`take_events`].
//!
//! [`take_events`]: GraphHierarchy::take_events

use crate::debug_invariants::DebugInvariants;
use crate::graph::element::{EdgeId, GraphId, IdLike, NodeId};
use crate::graph::event::GraphEvent;
use crate::graph::id_alloc::IdAllocator;
use crate::graph::id_set::{IndexedSet, SparseIdSet};
use crate::graph::incidence::IncidenceRecord;
use crate::graph::storage::GraphStorage;
use crate::graph_error::GraphError;

static EMPTY_RECORD: IncidenceRecord = IncidenceRecord::empty();

#[derive(Clone, Debug, Default)]
struct ViewMembers {
    nodes: SparseIdSet<NodeId>,
    edges: SparseIdSet<EdgeId>,
    node_data: hashbrown::HashMap<NodeId, IncidenceRecord>,
}

#[derive(Clone, Debug)]
enum Members {
    /// The root's membership is the storage itself.
    Root,
    View(ViewMembers),
}

#[derive(Clone, Debug)]
struct GraphRecord {
    parent: Option<GraphId>,
    children: Vec<GraphId>,
    members: Members,
}

/// Arena of graph views over one canonical topology.
#[derive(Clone, Debug)]
pub struct GraphHierarchy {
    storage: GraphStorage,
    graph_ids: IdAllocator,
    records: Vec<Option<GraphRecord>>,
    events: Vec<GraphEvent>,
}

impl Default for GraphHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphHierarchy {
    pub fn new() -> Self {
        let mut graph_ids = IdAllocator::new();
        let root = graph_ids.get();
        debug_assert_eq!(root, GraphId::ROOT.get());
        Self {
            storage: GraphStorage::new(),
            graph_ids,
            records: vec![Some(GraphRecord {
                parent: None,
                children: Vec::new(),
                members: Members::Root,
            })],
            events: Vec::new(),
        }
    }

    /// Drains the structural event log accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read access to the canonical topology.
    pub fn storage(&self) -> &GraphStorage {
        &self.storage
    }

    // -- arena plumbing -----------------------------------------------------

    fn record(&self, g: GraphId) -> &GraphRecord {
        self.records
            .get(g.index())
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("unknown graph {g:?}"))
    }

    fn record_mut(&mut self, g: GraphId) -> &mut GraphRecord {
        self.records
            .get_mut(g.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("unknown graph {g:?}"))
    }

    fn view_mut(&mut self, g: GraphId) -> &mut ViewMembers {
        match &mut self.record_mut(g).members {
            Members::View(v) => v,
            Members::Root => panic!("root graph has no view membership"),
        }
    }

    /// Ancestor chain of `g`, root first, `g` last.
    fn path_from_root(&self, g: GraphId) -> Vec<GraphId> {
        let mut path = Vec::new();
        let mut cur = Some(g);
        while let Some(x) = cur {
            path.push(x);
            cur = self.record(x).parent;
        }
        path.reverse();
        path
    }

    // -- tree queries -------------------------------------------------------

    pub fn is_graph(&self, g: GraphId) -> bool {
        self.records
            .get(g.index())
            .is_some_and(|slot| slot.is_some())
    }

    pub fn parent(&self, g: GraphId) -> Option<GraphId> {
        self.record(g).parent
    }

    pub fn children(&self, g: GraphId) -> &[GraphId] {
        &self.record(g).children
    }

    /// Topmost ancestor of `g`; always [`GraphId::ROOT`] in a live arena.
    pub fn root_of(&self, g: GraphId) -> GraphId {
        let mut cur = g;
        while let Some(p) = self.record(cur).parent {
            cur = p;
        }
        cur
    }

    /// Live graph ids, in arena order.
    pub fn graphs(&self) -> impl Iterator<Item = GraphId> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| GraphId::from_index(i)))
    }

    /// Whether `g` sits strictly below `anc` in the tree.
    pub fn is_descendant(&self, anc: GraphId, g: GraphId) -> bool {
        let mut cur = self.record(g).parent;
        while let Some(x) = cur {
            if x == anc {
                return true;
            }
            cur = self.record(x).parent;
        }
        false
    }

    /// Finds the live descendant of `anc` carrying `id`.
    pub fn descendant(&self, anc: GraphId, id: GraphId) -> Option<GraphId> {
        if self.is_graph(id) && self.is_descendant(anc, id) {
            Some(id)
        } else {
            None
        }
    }

    // -- subgraph lifecycle -------------------------------------------------

    /// Creates an empty view under `parent`.
    pub fn add_subgraph(&mut self, parent: GraphId) -> GraphId {
        debug_assert!(self.is_graph(parent));
        let g = GraphId::new(self.graph_ids.get());
        if self.records.len() <= g.index() {
            self.records.resize_with(g.index() + 1, || None);
        }
        self.records[g.index()] = Some(GraphRecord {
            parent: Some(parent),
            children: Vec::new(),
            members: Members::View(ViewMembers::default()),
        });
        self.record_mut(parent).children.push(g);
        log::trace!("subgraph {g} created under {parent}");
        self.events.push(GraphEvent::AddSubGraph {
            graph: parent,
            subgraph: g,
        });
        g
    }

    /// Creates a view under `parent` populated by predicate. An edge is
    /// admitted only when the edge predicate admits it *and* both its ends
    /// were admitted. The initial population emits no per-element events.
    pub fn add_subgraph_filtered(
        &mut self,
        parent: GraphId,
        node_pred: impl Fn(NodeId) -> bool,
        edge_pred: impl Fn(EdgeId) -> bool,
    ) -> GraphId {
        let g = self.add_subgraph(parent);
        let admitted: Vec<NodeId> = self
            .nodes(parent)
            .iter()
            .copied()
            .filter(|&n| node_pred(n))
            .collect();
        {
            let vm = self.view_mut(g);
            vm.nodes.reserve(admitted.len());
            for &n in &admitted {
                vm.nodes.add(n);
                vm.node_data.insert(n, IncidenceRecord::new());
            }
        }
        let candidates: Vec<EdgeId> = self
            .edges(parent)
            .iter()
            .copied()
            .filter(|&e| edge_pred(e))
            .collect();
        for e in candidates {
            let (src, tgt) = self.storage.ends(e);
            if self.is_node_element(g, src) && self.is_node_element(g, tgt) {
                self.view_insert_edge(g, e, src, tgt);
            }
        }
        g
    }

    /// Destroys the view `g`, re-parenting its children to `g`'s parent.
    /// The root cannot be destroyed.
    pub fn del_subgraph(&mut self, g: GraphId) {
        debug_assert!(!g.is_root());
        let Some(parent) = self.record(g).parent else {
            log::warn!("ignoring attempt to destroy the root graph");
            return;
        };
        self.events.push(GraphEvent::DelSubGraph {
            graph: parent,
            subgraph: g,
        });
        let children = self.record(g).children.clone();
        for c in children {
            self.record_mut(c).parent = Some(parent);
            self.record_mut(parent).children.push(c);
        }
        self.record_mut(parent).children.retain(|&c| c != g);
        self.records[g.index()] = None;
        self.graph_ids.free(g.get());
        log::trace!("subgraph {g} destroyed, children re-parented to {parent}");
    }

    /// Destroys every subgraph below `g`, deepest first.
    pub fn del_all_subgraphs(&mut self, g: GraphId) {
        let children = self.record(g).children.clone();
        for c in children {
            self.destroy_subtree(c);
        }
    }

    fn destroy_subtree(&mut self, g: GraphId) {
        let children = self.record(g).children.clone();
        for c in children {
            self.destroy_subtree(c);
        }
        let Some(parent) = self.record(g).parent else {
            return;
        };
        self.events.push(GraphEvent::DelSubGraph {
            graph: parent,
            subgraph: g,
        });
        self.record_mut(parent).children.retain(|&c| c != g);
        self.records[g.index()] = None;
        self.graph_ids.free(g.get());
    }

    // -- membership & element queries ---------------------------------------

    pub fn is_node_element(&self, g: GraphId, n: NodeId) -> bool {
        match &self.record(g).members {
            Members::Root => self.storage.is_node_element(n),
            Members::View(v) => v.nodes.is_element(n),
        }
    }

    pub fn is_edge_element(&self, g: GraphId, e: EdgeId) -> bool {
        match &self.record(g).members {
            Members::Root => self.storage.is_edge_element(e),
            Members::View(v) => v.edges.is_element(e),
        }
    }

    pub fn num_nodes(&self, g: GraphId) -> usize {
        match &self.record(g).members {
            Members::Root => self.storage.number_of_nodes(),
            Members::View(v) => v.nodes.len(),
        }
    }

    pub fn num_edges(&self, g: GraphId) -> usize {
        match &self.record(g).members {
            Members::Root => self.storage.number_of_edges(),
            Members::View(v) => v.edges.len(),
        }
    }

    /// Node membership of `g`, in current order.
    pub fn nodes(&self, g: GraphId) -> &[NodeId] {
        match &self.record(g).members {
            Members::Root => self.storage.nodes(),
            Members::View(v) => v.nodes.as_slice(),
        }
    }

    /// Edge membership of `g`, in current order.
    pub fn edges(&self, g: GraphId) -> &[EdgeId] {
        match &self.record(g).members {
            Members::Root => self.storage.edges(),
            Members::View(v) => v.edges.as_slice(),
        }
    }

    pub fn node_pos(&self, g: GraphId, n: NodeId) -> Option<usize> {
        match &self.record(g).members {
            Members::Root => self.storage.node_pos(n),
            Members::View(v) => v.nodes.get_pos(n),
        }
    }

    pub fn edge_pos(&self, g: GraphId, e: EdgeId) -> Option<usize> {
        match &self.record(g).members {
            Members::Root => self.storage.edge_pos(e),
            Members::View(v) => v.edges.get_pos(e),
        }
    }

    fn incidence_record(&self, g: GraphId, n: NodeId) -> &IncidenceRecord {
        debug_assert!(self.is_node_element(g, n));
        match &self.record(g).members {
            Members::Root => self.storage.incidence(n),
            Members::View(v) => v.node_data.get(&n).unwrap_or(&EMPTY_RECORD),
        }
    }

    /// Edges incident to `n` inside `g`, out-edges first, self-loops twice.
    pub fn incidence(&self, g: GraphId, n: NodeId) -> &[EdgeId] {
        self.incidence_record(g, n).edges()
    }

    pub fn degree(&self, g: GraphId, n: NodeId) -> usize {
        self.incidence_record(g, n).degree()
    }

    pub fn out_degree(&self, g: GraphId, n: NodeId) -> usize {
        self.incidence_record(g, n).out_degree()
    }

    pub fn in_degree(&self, g: GraphId, n: NodeId) -> usize {
        self.incidence_record(g, n).in_degree()
    }

    /// Edges leaving `n` in `g`; a self-loop appears once.
    pub fn out_edges(&self, g: GraphId, n: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let rec = self.incidence_record(g, n);
        rec.edges()[..rec.out_degree()].iter().copied()
    }

    /// Edges entering `n` in `g`; a self-loop appears once.
    pub fn in_edges(&self, g: GraphId, n: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let rec = self.incidence_record(g, n);
        rec.edges()[rec.out_degree()..].iter().copied()
    }

    /// All edges at `n` in `g`; a self-loop appears once per direction.
    pub fn in_out_edges(&self, g: GraphId, n: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.incidence(g, n).iter().copied()
    }

    /// Successors of `n` in `g` (with multiplicity).
    pub fn out_nodes(&self, g: GraphId, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(g, n).map(|e| self.storage.target(e))
    }

    /// Predecessors of `n` in `g` (with multiplicity).
    pub fn in_nodes(&self, g: GraphId, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.in_edges(g, n).map(|e| self.storage.source(e))
    }

    /// Neighbors of `n` in `g` (with multiplicity, a self-loop yields `n`
    /// twice).
    pub fn in_out_nodes(&self, g: GraphId, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.in_out_edges(g, n).map(move |e| self.storage.opposite(e, n))
    }

    pub fn source(&self, e: EdgeId) -> NodeId {
        self.storage.source(e)
    }

    pub fn target(&self, e: EdgeId) -> NodeId {
        self.storage.target(e)
    }

    pub fn ends(&self, e: EdgeId) -> (NodeId, NodeId) {
        self.storage.ends(e)
    }

    pub fn opposite(&self, e: EdgeId, n: NodeId) -> NodeId {
        self.storage.opposite(e, n)
    }

    /// First edge of `g` joining `src` to `tgt`, `EdgeId::INVALID` when
    /// none does.
    pub fn exist_edge(&self, g: GraphId, src: NodeId, tgt: NodeId, directed: bool) -> EdgeId {
        self.edges_between(g, src, tgt, directed)
            .into_iter()
            .next()
            .unwrap_or(EdgeId::INVALID)
    }

    /// All edges of `g` joining `src` to `tgt`; a self-loop is reported
    /// once despite its doubled incidence entry.
    pub fn edges_between(
        &self,
        g: GraphId,
        src: NodeId,
        tgt: NodeId,
        directed: bool,
    ) -> Vec<EdgeId> {
        let mut found = Vec::new();
        if !self.is_node_element(g, src) || !self.is_node_element(g, tgt) {
            return found;
        }
        for &e in self.incidence(g, src) {
            let (s, t) = self.storage.ends(e);
            let hit = (s == src && t == tgt) || (!directed && s == tgt && t == src);
            if hit && !found.contains(&e) {
                found.push(e);
            }
        }
        found
    }

    // -- node mutation ------------------------------------------------------

    /// Mints a node at the root and registers it in every graph from the
    /// root down to `g`.
    pub fn add_node(&mut self, g: GraphId) -> NodeId {
        let n = self.storage.add_node();
        self.events.push(GraphEvent::AddNode {
            graph: GraphId::ROOT,
            node: n,
        });
        for v in self.path_from_root(g).into_iter().skip(1) {
            let vm = self.view_mut(v);
            vm.nodes.add(n);
            vm.node_data.insert(n, IncidenceRecord::new());
            self.events.push(GraphEvent::AddNode { graph: v, node: n });
        }
        n
    }

    /// Bulk [`add_node`](Self::add_node), one event per graph.
    pub fn add_nodes(&mut self, g: GraphId, nb: usize) -> Vec<NodeId> {
        let added = self.storage.add_nodes(nb);
        self.events.push(GraphEvent::AddNodes {
            graph: GraphId::ROOT,
            count: nb,
        });
        for v in self.path_from_root(g).into_iter().skip(1) {
            let vm = self.view_mut(v);
            vm.nodes.reserve(nb);
            for &n in &added {
                vm.nodes.add(n);
                vm.node_data.insert(n, IncidenceRecord::new());
            }
            self.events.push(GraphEvent::AddNodes { graph: v, count: nb });
        }
        added
    }

    /// Registers a node already live at the root into `g`, pulling it into
    /// any ancestor view that lacks it first.
    pub fn add_existing_node(&mut self, g: GraphId, n: NodeId) {
        debug_assert!(self.storage.is_node_element(n));
        if self.is_node_element(g, n) {
            return;
        }
        let Some(parent) = self.record(g).parent else {
            return;
        };
        self.add_existing_node(parent, n);
        let vm = self.view_mut(g);
        vm.nodes.add(n);
        vm.node_data.insert(n, IncidenceRecord::new());
        self.events.push(GraphEvent::AddNode { graph: g, node: n });
    }

    /// Re-creates a previously deleted node under its old id in `g` only
    /// (undo seam). For a view, the node must already be live at the root
    /// and in `g`'s parent.
    pub fn restore_node(&mut self, g: GraphId, n: NodeId) {
        if g.is_root() {
            self.storage.restore_node(n);
        } else {
            debug_assert!(self.storage.is_node_element(n));
            debug_assert!({
                let p = self.record(g).parent.unwrap_or(GraphId::ROOT);
                self.is_node_element(p, n)
            });
            let vm = self.view_mut(g);
            vm.nodes.add(n);
            vm.node_data.insert(n, IncidenceRecord::new());
        }
        self.events.push(GraphEvent::AddNode { graph: g, node: n });
    }

    /// Deletes `n` from `g` and every graph below it, leaves first, taking
    /// `g`'s incident edges along. With `all_graphs`, executes at the root
    /// so no graph keeps the node.
    pub fn del_node(&mut self, g: GraphId, n: NodeId, all_graphs: bool) {
        let at = if all_graphs { GraphId::ROOT } else { g };
        self.del_node_in(at, n);
    }

    fn del_node_in(&mut self, g: GraphId, n: NodeId) {
        debug_assert!(self.is_node_element(g, n));
        // edges to take along, captured in g before the cascade
        let mut edges: Vec<EdgeId> = Vec::new();
        for &e in self.incidence(g, n) {
            if !edges.contains(&e) {
                edges.push(e);
            }
        }
        // leaves-first walk: a graph is processed once none of its
        // children still holds the node
        let mut stack: Vec<GraphId> = self
            .record(g)
            .children
            .iter()
            .copied()
            .filter(|&c| self.is_node_element(c, n))
            .collect();
        while let Some(&top) = stack.last() {
            let pending: Vec<GraphId> = self
                .record(top)
                .children
                .iter()
                .copied()
                .filter(|&c| self.is_node_element(c, n))
                .collect();
            if pending.is_empty() {
                self.remove_node_with_edges(top, n, &edges);
                stack.pop();
            } else {
                stack.extend(pending);
            }
        }
        self.remove_node_with_edges(g, n, &edges);
    }

    fn remove_node_with_edges(&mut self, g: GraphId, n: NodeId, edges: &[EdgeId]) {
        for &e in edges {
            if self.is_edge_element(g, e) {
                self.remove_edge_local(g, e);
            }
        }
        self.remove_node_local(g, n);
    }

    fn remove_node_local(&mut self, g: GraphId, n: NodeId) {
        self.events.push(GraphEvent::DelNode { graph: g, node: n });
        match &mut self.record_mut(g).members {
            Members::Root => self.storage.del_node(n),
            Members::View(v) => {
                v.nodes.remove(n);
                v.node_data.remove(&n);
            }
        }
    }

    // -- edge mutation ------------------------------------------------------

    /// Mints an edge at the root and registers it in every graph from the
    /// root down to `g`. Both ends must already be members of `g`.
    pub fn add_edge(&mut self, g: GraphId, src: NodeId, tgt: NodeId) -> EdgeId {
        debug_assert!(self.is_node_element(g, src));
        debug_assert!(self.is_node_element(g, tgt));
        let e = self.storage.add_edge(src, tgt);
        self.events.push(GraphEvent::AddEdge {
            graph: GraphId::ROOT,
            edge: e,
        });
        for v in self.path_from_root(g).into_iter().skip(1) {
            self.view_insert_edge(v, e, src, tgt);
            self.events.push(GraphEvent::AddEdge { graph: v, edge: e });
        }
        e
    }

    /// Bulk [`add_edge`](Self::add_edge), one event per graph.
    pub fn add_edges(&mut self, g: GraphId, ends: &[(NodeId, NodeId)]) -> Vec<EdgeId> {
        debug_assert!(ends
            .iter()
            .all(|&(s, t)| self.is_node_element(g, s) && self.is_node_element(g, t)));
        let added = self.storage.add_edges(ends);
        self.events.push(GraphEvent::AddEdges {
            graph: GraphId::ROOT,
            count: ends.len(),
        });
        for v in self.path_from_root(g).into_iter().skip(1) {
            for (&e, &(src, tgt)) in added.iter().zip(ends) {
                self.view_insert_edge(v, e, src, tgt);
            }
            self.events.push(GraphEvent::AddEdges {
                graph: v,
                count: ends.len(),
            });
        }
        added
    }

    /// Registers an edge already live at the root into `g`, pulling it
    /// into any ancestor view that lacks it first. Both ends must be
    /// members of `g`.
    pub fn add_existing_edge(&mut self, g: GraphId, e: EdgeId) {
        debug_assert!(self.storage.is_edge_element(e));
        let (src, tgt) = self.storage.ends(e);
        debug_assert!(self.is_node_element(g, src));
        debug_assert!(self.is_node_element(g, tgt));
        if self.is_edge_element(g, e) {
            return;
        }
        let Some(parent) = self.record(g).parent else {
            return;
        };
        self.add_existing_edge(parent, e);
        self.view_insert_edge(g, e, src, tgt);
        self.events.push(GraphEvent::AddEdge { graph: g, edge: e });
    }

    /// Re-creates a previously deleted edge under its old id in `g` only
    /// (undo seam).
    pub fn restore_edge(&mut self, g: GraphId, e: EdgeId, src: NodeId, tgt: NodeId) {
        if g.is_root() {
            self.storage.restore_edge(e, src, tgt);
        } else {
            debug_assert!(self.storage.is_edge_element(e));
            debug_assert!(self.is_node_element(g, src));
            debug_assert!(self.is_node_element(g, tgt));
            self.view_insert_edge(g, e, src, tgt);
        }
        self.events.push(GraphEvent::AddEdge { graph: g, edge: e });
    }

    fn view_insert_edge(&mut self, g: GraphId, e: EdgeId, src: NodeId, tgt: NodeId) {
        let vm = self.view_mut(g);
        vm.edges.add(e);
        vm.node_data.entry(src).or_default().push_out(e);
        vm.node_data.entry(tgt).or_default().push_in(e);
    }

    /// Deletes `e` from `g` and every graph below it, descendants first.
    /// With `all_graphs`, executes at the root so no graph keeps the edge.
    pub fn del_edge(&mut self, g: GraphId, e: EdgeId, all_graphs: bool) {
        let at = if all_graphs { GraphId::ROOT } else { g };
        self.del_edge_in(at, e);
    }

    fn del_edge_in(&mut self, g: GraphId, e: EdgeId) {
        debug_assert!(self.is_edge_element(g, e));
        let children = self.record(g).children.clone();
        for c in children {
            if self.is_edge_element(c, e) {
                self.del_edge_in(c, e);
            }
        }
        self.remove_edge_local(g, e);
    }

    fn remove_edge_local(&mut self, g: GraphId, e: EdgeId) {
        self.events.push(GraphEvent::DelEdge { graph: g, edge: e });
        let (src, tgt) = self.storage.ends(e);
        match &mut self.record_mut(g).members {
            Members::Root => self.storage.del_edge(e),
            Members::View(v) => {
                v.edges.remove(e);
                if let Some(rec) = v.node_data.get_mut(&src) {
                    rec.remove(e);
                }
                if tgt != src {
                    if let Some(rec) = v.node_data.get_mut(&tgt) {
                        rec.remove(e);
                    }
                }
            }
        }
    }

    // -- endpoint rewiring --------------------------------------------------

    /// Rebinds the endpoints of `e` everywhere it is visible. An invalid id
    /// keeps the current endpoint on that side. A view whose membership
    /// does not cover the new ends loses the edge instead, descendants
    /// first. The new ends must be live at the root.
    pub fn set_ends(&mut self, g: GraphId, e: EdgeId, src: NodeId, tgt: NodeId) {
        debug_assert!(self.is_edge_element(g, e));
        let old = self.storage.ends(e);
        let new_src = if src.is_valid() { src } else { old.0 };
        let new_tgt = if tgt.is_valid() { tgt } else { old.1 };
        if (new_src, new_tgt) == old {
            return;
        }
        debug_assert!(self.storage.is_node_element(new_src));
        debug_assert!(self.storage.is_node_element(new_tgt));
        self.events.push(GraphEvent::BeforeSetEnds {
            graph: GraphId::ROOT,
            edge: e,
        });
        self.storage.set_ends(e, new_src, new_tgt);
        self.events.push(GraphEvent::AfterSetEnds {
            graph: GraphId::ROOT,
            edge: e,
            old,
        });
        let children = self.record(GraphId::ROOT).children.clone();
        for c in children {
            self.set_ends_internal(c, e, old, (new_src, new_tgt));
        }
    }

    pub fn set_source(&mut self, g: GraphId, e: EdgeId, src: NodeId) {
        self.set_ends(g, e, src, NodeId::INVALID);
    }

    pub fn set_target(&mut self, g: GraphId, e: EdgeId, tgt: NodeId) {
        self.set_ends(g, e, NodeId::INVALID, tgt);
    }

    fn set_ends_internal(
        &mut self,
        g: GraphId,
        e: EdgeId,
        old: (NodeId, NodeId),
        new: (NodeId, NodeId),
    ) {
        if !self.is_edge_element(g, e) {
            return;
        }
        if self.is_node_element(g, new.0) && self.is_node_element(g, new.1) {
            self.events.push(GraphEvent::BeforeSetEnds { graph: g, edge: e });
            {
                let vm = self.view_mut(g);
                if old.0 != new.0 {
                    vm.node_data.entry(new.0).or_default().push_out(e);
                    if let Some(rec) = vm.node_data.get_mut(&old.0) {
                        rec.remove_out(e);
                    }
                }
                if old.1 != new.1 {
                    vm.node_data.entry(new.1).or_default().push_in(e);
                    if let Some(rec) = vm.node_data.get_mut(&old.1) {
                        rec.remove_in(e);
                    }
                }
            }
            self.events.push(GraphEvent::AfterSetEnds {
                graph: g,
                edge: e,
                old,
            });
            let children = self.record(g).children.clone();
            for c in children {
                self.set_ends_internal(c, e, old, new);
            }
        } else {
            // the rewired edge leaves this view; descendants go first
            let children = self.record(g).children.clone();
            for c in children {
                self.set_ends_internal(c, e, old, new);
            }
            self.events.push(GraphEvent::DelEdge { graph: g, edge: e });
            let vm = self.view_mut(g);
            vm.edges.remove(e);
            if let Some(rec) = vm.node_data.get_mut(&old.0) {
                rec.remove_out(e);
            }
            if let Some(rec) = vm.node_data.get_mut(&old.1) {
                rec.remove_in(e);
            }
        }
    }

    /// Flips the direction of `e` everywhere it is visible.
    pub fn reverse(&mut self, g: GraphId, e: EdgeId) {
        debug_assert!(self.is_edge_element(g, e));
        let (src, tgt) = self.storage.ends(e);
        self.storage.reverse(e);
        self.events.push(GraphEvent::ReverseEdge {
            graph: GraphId::ROOT,
            edge: e,
        });
        let children = self.record(GraphId::ROOT).children.clone();
        for c in children {
            self.reverse_internal(c, e, src, tgt);
        }
    }

    fn reverse_internal(&mut self, g: GraphId, e: EdgeId, src: NodeId, tgt: NodeId) {
        if !self.is_edge_element(g, e) {
            return;
        }
        if src != tgt {
            let vm = self.view_mut(g);
            if let Some(rec) = vm.node_data.get_mut(&src) {
                rec.make_in(e);
            }
            if let Some(rec) = vm.node_data.get_mut(&tgt) {
                rec.make_out(e);
            }
        }
        self.events.push(GraphEvent::ReverseEdge { graph: g, edge: e });
        let children = self.record(g).children.clone();
        for c in children {
            self.reverse_internal(c, e, src, tgt);
        }
    }

    // -- ordering & capacity ------------------------------------------------

    /// Ascending sort of `g`'s node and edge orders.
    pub fn sort_elements(&mut self, g: GraphId) {
        match &mut self.record_mut(g).members {
            Members::Root => self.storage.sort_elements(),
            Members::View(v) => {
                v.nodes.sort();
                v.edges.sort();
            }
        }
    }

    /// Rewrites the incidence order of `n` inside `g`.
    pub fn set_edge_order(&mut self, g: GraphId, n: NodeId, order: &[EdgeId]) {
        debug_assert!(self.is_node_element(g, n));
        match &mut self.record_mut(g).members {
            Members::Root => self.storage.set_edge_order(n, order),
            Members::View(v) => {
                if let Some(rec) = v.node_data.get_mut(&n) {
                    rec.set_order(order);
                }
            }
        }
    }

    /// Exchanges two edges in the incidence order of `n` inside `g`.
    pub fn swap_edge_order(&mut self, g: GraphId, n: NodeId, e1: EdgeId, e2: EdgeId) {
        debug_assert!(self.is_node_element(g, n));
        match &mut self.record_mut(g).members {
            Members::Root => self.storage.swap_edge_order(n, e1, e2),
            Members::View(v) => {
                if let Some(rec) = v.node_data.get_mut(&n) {
                    rec.swap_edge_order(e1, e2);
                }
            }
        }
    }

    /// Capacity hint; the canonical storage always takes it, a view also
    /// pre-sizes its own sets.
    pub fn reserve_nodes(&mut self, g: GraphId, nb: usize) {
        self.storage.reserve_nodes(nb);
        if let Members::View(v) = &mut self.record_mut(g).members {
            v.nodes.reserve(nb);
        }
    }

    pub fn reserve_edges(&mut self, g: GraphId, nb: usize) {
        self.storage.reserve_edges(nb);
        if let Members::View(v) = &mut self.record_mut(g).members {
            v.edges.reserve(nb);
        }
    }
}

impl DebugInvariants for GraphHierarchy {
    fn debug_assert_invariants(&self) {
        crate::graph_debug_assert_ok!(self.validate_invariants(), "GraphHierarchy invalid");
    }

    fn validate_invariants(&self) -> Result<(), GraphError> {
        self.storage.validate_invariants()?;
        for g in self.graphs() {
            let rec = self.record(g);
            for &c in &rec.children {
                if !self.is_graph(c) {
                    return Err(GraphError::UnknownGraph(c.get()));
                }
                if self.record(c).parent != Some(g) {
                    return Err(GraphError::UnknownGraph(c.get()));
                }
            }
            let Members::View(v) = &rec.members else {
                continue;
            };
            let parent = rec.parent.unwrap_or(GraphId::ROOT);
            for n in v.nodes.iter() {
                if !self.storage.is_node_element(n) || !self.is_node_element(parent, n) {
                    return Err(GraphError::NotSubsetOfParent {
                        graph: g.get(),
                        elt: n.get(),
                    });
                }
            }
            for e in v.edges.iter() {
                if !self.storage.is_edge_element(e) || !self.is_edge_element(parent, e) {
                    return Err(GraphError::NotSubsetOfParent {
                        graph: g.get(),
                        elt: e.get(),
                    });
                }
                let (src, tgt) = self.storage.ends(e);
                for n in [src, tgt] {
                    if !v.nodes.is_element(n) {
                        return Err(GraphError::DanglingEdge {
                            graph: g.get(),
                            edge: e.get(),
                            node: n.get(),
                        });
                    }
                    let present = v
                        .node_data
                        .get(&n)
                        .is_some_and(|rec| rec.edges().contains(&e));
                    if !present {
                        return Err(GraphError::MissingIncidence {
                            graph: g.get(),
                            edge: e.get(),
                            node: n.get(),
                        });
                    }
                }
            }
            for n in v.nodes.iter() {
                let Some(data) = v.node_data.get(&n) else {
                    continue;
                };
                let out_ok = data.edges()[..data.out_degree()]
                    .iter()
                    .all(|&e| v.edges.is_element(e) && self.storage.source(e) == n);
                let in_ok = data.edges()[data.out_degree()..]
                    .iter()
                    .all(|&e| v.edges.is_element(e) && self.storage.target(e) == n);
                if !(out_ok && in_ok) {
                    return Err(GraphError::DegreeMismatch {
                        graph: g.get(),
                        node: n.get(),
                        len: data.degree(),
                        out: data.out_degree() as u32,
                    });
                }
            }
        }
        Ok(())
    }
}
