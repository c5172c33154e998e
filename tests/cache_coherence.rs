//! The cached bounds must always agree with a full rescan.

use graph_views::prelude::*;

const ROOT: GraphId = GraphId::ROOT;

/// Oracle: what a scan of `g` would report right now.
fn rescan_nodes(h: &GraphHierarchy, mm: &MinMaxProperty<i64>, g: GraphId) -> (i64, i64) {
    let prop = mm.property();
    let mut values: Vec<i64> = h.nodes(g).iter().map(|&n| *prop.node_value(n)).collect();
    if values.is_empty() || !prop.has_non_default_valuated_nodes_in(h, g) {
        let d = *prop.node_default_value();
        return (d, d);
    }
    values.sort_unstable();
    (values[0], *values.last().unwrap())
}

fn assert_coherent(h: &GraphHierarchy, mm: &mut MinMaxProperty<i64>, g: GraphId) {
    let (min, max) = rescan_nodes(h, mm, g);
    assert_eq!(mm.node_min(g, h), min, "min out of date for {g:?}");
    assert_eq!(mm.node_max(g, h), max, "max out of date for {g:?}");
}

fn fresh() -> MinMaxProperty<i64> {
    MinMaxProperty::new(
        ElementProperty::new(0, 0),
        (i64::MIN, i64::MAX),
        (i64::MIN, i64::MAX),
    )
}

#[test]
fn bounds_stay_coherent_across_structural_churn() {
    let mut h = GraphHierarchy::new();
    let ns = h.add_nodes(ROOT, 6);
    for w in ns.windows(2) {
        h.add_edge(ROOT, w[0], w[1]);
    }
    let sg = h.add_subgraph_filtered(ROOT, |n| n.get() % 2 == 0, |_| true);
    h.take_events();

    let mut mm = fresh();
    for (i, &n) in ns.iter().enumerate() {
        mm.set_node_value(n, (i as i64) * 10 - 20);
    }
    assert_coherent(&h, &mut mm, ROOT);
    assert_coherent(&h, &mut mm, sg);

    // grow, shrink, grow again, checking after every drain
    let extra = h.add_node(sg);
    mm.process_events(&h.take_events());
    mm.set_node_value(extra, 99);
    assert_coherent(&h, &mut mm, ROOT);
    assert_coherent(&h, &mut mm, sg);

    h.del_node(ROOT, ns[0], false); // holds the minimum
    mm.process_events(&h.take_events());
    assert_coherent(&h, &mut mm, ROOT);
    assert_coherent(&h, &mut mm, sg);

    h.del_node(sg, ns[2], false); // view-only removal
    mm.process_events(&h.take_events());
    assert_coherent(&h, &mut mm, ROOT);
    assert_coherent(&h, &mut mm, sg);

    mm.set_all_node_values(5);
    assert_coherent(&h, &mut mm, ROOT);
    assert_coherent(&h, &mut mm, sg);
}

#[test]
fn interior_deletions_never_invalidate() {
    let mut h = GraphHierarchy::new();
    let ns = h.add_nodes(ROOT, 5);
    h.take_events();
    let mut mm = fresh();
    mm.set_node_value(ns[0], -10);
    mm.set_node_value(ns[4], 10);
    for (i, &n) in ns[1..4].iter().enumerate() {
        mm.set_node_value(n, i as i64);
    }
    assert_eq!(mm.node_min(ROOT, &h), -10);

    // deleting interior values must be served from cache
    for &n in &ns[1..4] {
        h.del_node(ROOT, n, false);
        mm.process_events(&h.take_events());
        assert_eq!(mm.cached_node_min_max(ROOT), Some((-10, 10)));
    }
    assert_coherent(&h, &mut mm, ROOT);
}

#[test]
fn view_lifecycle_churn_never_leaks_cached_bounds() {
    let mut h = GraphHierarchy::new();
    let ns = h.add_nodes(ROOT, 4);
    h.take_events();
    let mut mm = fresh();
    for (i, &n) in ns.iter().enumerate() {
        mm.set_node_value(n, i as i64 + 1);
    }

    // destroy and re-create views; each reincarnation reuses the freed id
    // and must always read like a fresh rescan
    for round in 0..3 {
        let cut = ns[round];
        let sg = h.add_subgraph_filtered(ROOT, |n| n != cut, |_| true);
        mm.process_events(&h.take_events());
        assert_coherent(&h, &mut mm, sg);
        assert_coherent(&h, &mut mm, ROOT);

        h.del_subgraph(sg);
        mm.process_events(&h.take_events());
        assert!(mm.cached_node_min_max(sg).is_none());
        assert!(!mm.is_observing(sg));
    }
}

#[test]
fn value_churn_on_a_view_tracks_membership() {
    let mut h = GraphHierarchy::new();
    let ns = h.add_nodes(ROOT, 4);
    let sg = h.add_subgraph_filtered(ROOT, |n| n != ns[3], |_| true);
    h.take_events();
    let mut mm = fresh();
    // the view must ignore the out-of-view extreme
    mm.set_node_value(ns[3], 1_000);
    mm.set_node_value(ns[1], 7);
    assert_eq!(mm.node_max(sg, &h), 7);
    assert_eq!(mm.node_max(ROOT, &h), 1_000);

    mm.set_node_value(ns[2], -3);
    assert_coherent(&h, &mut mm, sg);
    assert_coherent(&h, &mut mm, ROOT);
}
