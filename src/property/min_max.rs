//! Lazily cached per-graph extrema of a property.
//!
//! The cache follows a three-state protocol per (side, graph): nothing is
//! computed until a bound is asked for; a computed pair is served until an
//! event or value write could move it; invalidation is coarse for element
//! additions and value shifts (the whole side is dropped) and localized
//! for deletions (only the graph whose bound was deleted). Structural
//! changes arrive as drained [`GraphEvent`]s, so the hierarchy stays
//! unaware of the cache.

use crate::graph::element::{EdgeId, GraphId, NodeId};
use crate::graph::event::GraphEvent;
use crate::graph::hierarchy::GraphHierarchy;
use crate::property::element_property::{ElementProperty, PropertyValue};

/// Min/max cache layered over an [`ElementProperty`].
#[derive(Clone, Debug)]
pub struct MinMaxProperty<T: PropertyValue> {
    prop: ElementProperty<T>,
    // configured domain bounds, used to seed the fold inverted
    node_bounds: (T, T),
    edge_bounds: (T, T),
    min_max_node: hashbrown::HashMap<GraphId, (T, T)>,
    min_max_edge: hashbrown::HashMap<GraphId, (T, T)>,
    observed: hashbrown::HashSet<GraphId>,
}

impl<T: PropertyValue> MinMaxProperty<T> {
    /// Wraps `prop`; `node_bounds`/`edge_bounds` are the `(lowest,
    /// highest)` representable values of the payload domain.
    pub fn new(prop: ElementProperty<T>, node_bounds: (T, T), edge_bounds: (T, T)) -> Self {
        Self {
            prop,
            node_bounds,
            edge_bounds,
            min_max_node: hashbrown::HashMap::new(),
            min_max_edge: hashbrown::HashMap::new(),
            observed: hashbrown::HashSet::new(),
        }
    }

    pub fn property(&self) -> &ElementProperty<T> {
        &self.prop
    }

    pub fn node_min(&mut self, g: GraphId, h: &GraphHierarchy) -> T {
        self.node_min_max(g, h).0
    }

    pub fn node_max(&mut self, g: GraphId, h: &GraphHierarchy) -> T {
        self.node_min_max(g, h).1
    }

    pub fn edge_min(&mut self, g: GraphId, h: &GraphHierarchy) -> T {
        self.edge_min_max(g, h).0
    }

    pub fn edge_max(&mut self, g: GraphId, h: &GraphHierarchy) -> T {
        self.edge_min_max(g, h).1
    }

    fn node_min_max(&mut self, g: GraphId, h: &GraphHierarchy) -> (T, T) {
        if let Some(mm) = self.min_max_node.get(&g) {
            return mm.clone();
        }
        let mm = if self.prop.has_non_default_valuated_nodes_in(h, g) {
            // seed inverted with the domain bounds so any real value wins
            let mut min = self.node_bounds.1.clone();
            let mut max = self.node_bounds.0.clone();
            for &n in h.nodes(g) {
                let v = self.prop.node_value(n);
                if *v < min {
                    min = v.clone();
                }
                if *v > max {
                    max = v.clone();
                }
            }
            if min > max {
                let d = self.prop.node_default_value().clone();
                (d.clone(), d)
            } else {
                (min, max)
            }
        } else {
            let d = self.prop.node_default_value().clone();
            (d.clone(), d)
        };
        if !self.min_max_edge.contains_key(&g) {
            self.observed.insert(g);
        }
        self.min_max_node.insert(g, mm.clone());
        mm
    }

    fn edge_min_max(&mut self, g: GraphId, h: &GraphHierarchy) -> (T, T) {
        if let Some(mm) = self.min_max_edge.get(&g) {
            return mm.clone();
        }
        let mm = if self.prop.has_non_default_valuated_edges_in(h, g) {
            let mut min = self.edge_bounds.1.clone();
            let mut max = self.edge_bounds.0.clone();
            for &e in h.edges(g) {
                let v = self.prop.edge_value(e);
                if *v < min {
                    min = v.clone();
                }
                if *v > max {
                    max = v.clone();
                }
            }
            if min > max {
                let d = self.prop.edge_default_value().clone();
                (d.clone(), d)
            } else {
                (min, max)
            }
        } else {
            let d = self.prop.edge_default_value().clone();
            (d.clone(), d)
        };
        if !self.min_max_node.contains_key(&g) {
            self.observed.insert(g);
        }
        self.min_max_edge.insert(g, mm.clone());
        mm
    }

    /// Writes a node value, dropping the node-side cache first when any
    /// cached pair could move.
    pub fn set_node_value(&mut self, n: NodeId, v: T) {
        if !self.min_max_node.is_empty() {
            let old = self.prop.node_value(n).clone();
            if v != old {
                let shifts = self
                    .min_max_node
                    .values()
                    .any(|(mn, mx)| v < *mn || v > *mx || old == *mn || old == *mx);
                if shifts {
                    self.drop_node_cache();
                }
            }
        }
        self.prop.set_node_value(n, v);
    }

    /// Writes an edge value, dropping the edge-side cache first when any
    /// cached pair could move.
    pub fn set_edge_value(&mut self, e: EdgeId, v: T) {
        if !self.min_max_edge.is_empty() {
            let old = self.prop.edge_value(e).clone();
            if v != old {
                let shifts = self
                    .min_max_edge
                    .values()
                    .any(|(mn, mx)| v < *mn || v > *mx || old == *mn || old == *mx);
                if shifts {
                    self.drop_edge_cache();
                }
            }
        }
        self.prop.set_edge_value(e, v);
    }

    /// Makes `v` every node's value; cached pairs collapse to `(v, v)`
    /// without a rescan.
    pub fn set_all_node_values(&mut self, v: T) {
        self.prop.set_all_node_values(v.clone());
        for mm in self.min_max_node.values_mut() {
            *mm = (v.clone(), v.clone());
        }
    }

    /// Makes `v` every edge's value; cached pairs collapse to `(v, v)`
    /// without a rescan.
    pub fn set_all_edge_values(&mut self, v: T) {
        self.prop.set_all_edge_values(v.clone());
        for mm in self.min_max_edge.values_mut() {
            *mm = (v.clone(), v.clone());
        }
    }

    /// Reacts to one drained hierarchy event. Call this with the output of
    /// [`GraphHierarchy::take_events`] *before* the deleted elements'
    /// values are erased from the property.
    pub fn handle_event(&mut self, ev: &GraphEvent) {
        match *ev {
            GraphEvent::AddNode { graph, .. } | GraphEvent::AddNodes { graph, .. }
                if self.observed.contains(&graph) =>
            {
                self.drop_node_cache();
            }
            GraphEvent::AddEdge { graph, .. } | GraphEvent::AddEdges { graph, .. }
                if self.observed.contains(&graph) =>
            {
                self.drop_edge_cache();
            }
            GraphEvent::DelNode { graph, node } if self.observed.contains(&graph) => {
                let on_bound = self
                    .min_max_node
                    .get(&graph)
                    .is_some_and(|(mn, mx)| {
                        let v = self.prop.node_value(node);
                        *v == *mn || *v == *mx
                    });
                if on_bound {
                    self.min_max_node.remove(&graph);
                    if !self.min_max_edge.contains_key(&graph) {
                        self.observed.remove(&graph);
                    }
                }
            }
            GraphEvent::DelEdge { graph, edge } if self.observed.contains(&graph) => {
                let on_bound = self
                    .min_max_edge
                    .get(&graph)
                    .is_some_and(|(mn, mx)| {
                        let v = self.prop.edge_value(edge);
                        *v == *mn || *v == *mx
                    });
                if on_bound {
                    self.min_max_edge.remove(&graph);
                    if !self.min_max_node.contains_key(&graph) {
                        self.observed.remove(&graph);
                    }
                }
            }
            GraphEvent::DelSubGraph { subgraph, .. } => {
                // graph ids are recycled; a dead view's entries must not be
                // served to the next view reusing its id
                self.min_max_node.remove(&subgraph);
                self.min_max_edge.remove(&subgraph);
                self.observed.remove(&subgraph);
            }
            _ => {}
        }
    }

    /// [`handle_event`](Self::handle_event) over a drained batch, in order.
    pub fn process_events(&mut self, events: &[GraphEvent]) {
        for ev in events {
            self.handle_event(ev);
        }
    }

    fn drop_node_cache(&mut self) {
        self.min_max_node.clear();
        let edge_cache = &self.min_max_edge;
        self.observed.retain(|g| edge_cache.contains_key(g));
    }

    fn drop_edge_cache(&mut self) {
        self.min_max_edge.clear();
        let node_cache = &self.min_max_node;
        self.observed.retain(|g| node_cache.contains_key(g));
    }

    /// Cache peek, for tests and diagnostics.
    pub fn cached_node_min_max(&self, g: GraphId) -> Option<(T, T)> {
        self.min_max_node.get(&g).cloned()
    }

    pub fn cached_edge_min_max(&self, g: GraphId) -> Option<(T, T)> {
        self.min_max_edge.get(&g).cloned()
    }

    pub fn is_observing(&self, g: GraphId) -> bool {
        self.observed.contains(&g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: GraphId = GraphId::ROOT;

    fn bounds() -> ((i32, i32), (i32, i32)) {
        ((i32::MIN, i32::MAX), (i32::MIN, i32::MAX))
    }

    fn valued_triple() -> (GraphHierarchy, Vec<NodeId>, MinMaxProperty<i32>) {
        let mut h = GraphHierarchy::new();
        let ns = h.add_nodes(ROOT, 3);
        h.take_events();
        let (nb, eb) = bounds();
        let mut mm = MinMaxProperty::new(ElementProperty::new(0, 0), nb, eb);
        mm.set_node_value(ns[0], 1);
        mm.set_node_value(ns[1], 5);
        mm.set_node_value(ns[2], 3);
        (h, ns, mm)
    }

    #[test]
    fn bounds_are_computed_lazily_and_cached() {
        let (h, _, mut mm) = valued_triple();
        assert_eq!(mm.cached_node_min_max(ROOT), None);
        assert!(!mm.is_observing(ROOT));
        assert_eq!(mm.node_min(ROOT, &h), 1);
        assert_eq!(mm.node_max(ROOT, &h), 5);
        assert_eq!(mm.cached_node_min_max(ROOT), Some((1, 5)));
        assert!(mm.is_observing(ROOT));
    }

    #[test]
    fn all_default_values_skip_the_scan() {
        let mut h = GraphHierarchy::new();
        h.add_nodes(ROOT, 4);
        let (nb, eb) = bounds();
        let mut mm = MinMaxProperty::new(ElementProperty::new(7, 0), nb, eb);
        assert_eq!(mm.node_min(ROOT, &h), 7);
        assert_eq!(mm.node_max(ROOT, &h), 7);
    }

    #[test]
    fn a_view_gets_its_own_bounds() {
        let (mut h, ns, mut mm) = valued_triple();
        let keep = [ns[0], ns[2]];
        let sg = h.add_subgraph_filtered(ROOT, |n| keep.contains(&n), |_| true);
        assert_eq!(mm.node_min(sg, &h), 1);
        assert_eq!(mm.node_max(sg, &h), 3);
        assert_eq!(mm.node_max(ROOT, &h), 5);
    }

    #[test]
    fn destroyed_views_leave_nothing_for_a_recycled_id() {
        let (mut h, ns, mut mm) = valued_triple();
        let keep = [ns[0], ns[2]];
        let sg = h.add_subgraph_filtered(ROOT, |n| keep.contains(&n), |_| true);
        assert_eq!(mm.node_min(sg, &h), 1);
        assert!(mm.is_observing(sg));

        h.del_subgraph(sg);
        let sg2 = h.add_subgraph(ROOT);
        assert_eq!(sg2, sg); // the arena reuses the freed id
        mm.process_events(&h.take_events());

        assert_eq!(mm.cached_node_min_max(sg2), None);
        assert!(!mm.is_observing(sg2));
        // the reborn view is empty, so its bounds are the default
        assert_eq!(mm.node_min(sg2, &h), 0);
    }

    #[test]
    fn adding_a_node_drops_the_node_side() {
        let (mut h, _, mut mm) = valued_triple();
        mm.node_min(ROOT, &h);
        h.add_node(ROOT);
        mm.process_events(&h.take_events());
        assert_eq!(mm.cached_node_min_max(ROOT), None);
        // recompute sees the new default-valued node
        assert_eq!(mm.node_min(ROOT, &h), 0);
    }

    #[test]
    fn deleting_a_bound_node_drops_only_that_entry() {
        let (mut h, ns, mut mm) = valued_triple();
        let sg = h.add_subgraph_filtered(ROOT, |_| true, |_| true);
        h.take_events();
        mm.node_min(ROOT, &h);
        mm.node_min(sg, &h);
        // ns[2] holds 3, strictly inside the bounds of both graphs
        h.del_node(sg, ns[2], false);
        mm.process_events(&h.take_events());
        assert_eq!(mm.cached_node_min_max(sg), Some((1, 5)));
        assert_eq!(mm.cached_node_min_max(ROOT), Some((1, 5)));
        // ns[1] holds the max
        h.del_node(ROOT, ns[1], false);
        mm.process_events(&h.take_events());
        assert_eq!(mm.cached_node_min_max(ROOT), None);
        assert!(!mm.is_observing(ROOT));
        // survivors hold 1 and 3
        assert_eq!(mm.node_max(ROOT, &h), 3);
    }

    #[test]
    fn value_writes_inside_the_bounds_keep_the_cache() {
        let (h, ns, mut mm) = valued_triple();
        mm.node_min(ROOT, &h);
        mm.set_node_value(ns[2], 2);
        assert_eq!(mm.cached_node_min_max(ROOT), Some((1, 5)));
        // moving past the max invalidates
        mm.set_node_value(ns[2], 9);
        assert_eq!(mm.cached_node_min_max(ROOT), None);
        assert_eq!(mm.node_max(ROOT, &h), 9);
    }

    #[test]
    fn overwriting_a_bound_value_invalidates() {
        let (h, ns, mut mm) = valued_triple();
        mm.node_min(ROOT, &h);
        // 1 is the cached min; rewriting it may shrink the range
        mm.set_node_value(ns[0], 4);
        assert_eq!(mm.cached_node_min_max(ROOT), None);
        assert_eq!(mm.node_min(ROOT, &h), 3);
    }

    #[test]
    fn set_all_collapses_cached_pairs_without_rescan() {
        let (mut h, _, mut mm) = valued_triple();
        let sg = h.add_subgraph_filtered(ROOT, |_| true, |_| true);
        mm.node_min(ROOT, &h);
        mm.node_min(sg, &h);
        mm.set_all_node_values(8);
        assert_eq!(mm.cached_node_min_max(ROOT), Some((8, 8)));
        assert_eq!(mm.cached_node_min_max(sg), Some((8, 8)));
        assert_eq!(mm.node_min(ROOT, &h), 8);
    }

    #[test]
    fn observation_survives_while_one_side_is_cached() {
        let mut h = GraphHierarchy::new();
        let ns = h.add_nodes(ROOT, 2);
        let e = h.add_edge(ROOT, ns[0], ns[1]);
        h.take_events();
        let (nb, eb) = bounds();
        let mut mm = MinMaxProperty::new(ElementProperty::new(0, 0), nb, eb);
        mm.set_node_value(ns[0], 2);
        mm.set_edge_value(e, 4);
        mm.node_min(ROOT, &h);
        mm.edge_min(ROOT, &h);
        // a node add clears the node side but the edge side keeps `ROOT`
        // under observation
        h.add_node(ROOT);
        mm.process_events(&h.take_events());
        assert_eq!(mm.cached_node_min_max(ROOT), None);
        assert_eq!(mm.cached_edge_min_max(ROOT), Some((4, 4)));
        assert!(mm.is_observing(ROOT));
    }

    #[test]
    fn edge_bounds_follow_the_same_protocol() {
        let mut h = GraphHierarchy::new();
        let ns = h.add_nodes(ROOT, 3);
        let e1 = h.add_edge(ROOT, ns[0], ns[1]);
        let e2 = h.add_edge(ROOT, ns[1], ns[2]);
        h.take_events();
        let (nb, eb) = bounds();
        let mut mm = MinMaxProperty::new(ElementProperty::new(0, 0), nb, eb);
        mm.set_edge_value(e1, -2);
        mm.set_edge_value(e2, 6);
        assert_eq!(mm.edge_min(ROOT, &h), -2);
        assert_eq!(mm.edge_max(ROOT, &h), 6);
        h.del_edge(ROOT, e1, false);
        mm.process_events(&h.take_events());
        assert_eq!(mm.cached_edge_min_max(ROOT), None);
        // the surviving edge holds 6
        assert_eq!(mm.edge_min(ROOT, &h), 6);
    }
}
