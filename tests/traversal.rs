use std::collections::BTreeSet;

use roadgraph::{CarFlags, EdgeRef, FlagCodec, GraphError, Result, RoadGraph};

fn neighbor_set(iter: impl Iterator<Item = Result<EdgeRef>>) -> BTreeSet<usize> {
    iter.map(|edge| edge.unwrap().node()).collect()
}

fn grid_graph() -> RoadGraph {
    let mut graph: RoadGraph = RoadGraph::new(16);
    for i in 0..5 {
        graph.set_node(i, 50.0 + i as f64, 8.0 + i as f64);
    }
    graph.edge(0, 1, 5.0, CarFlags::default_flags(true)).unwrap();
    graph.edge(0, 2, 3.0, CarFlags::default_flags(true)).unwrap();
    graph.edge(2, 3, 1.0, CarFlags::default_flags(false)).unwrap();
    graph.edge(3, 4, 2.0, CarFlags::default_flags(true)).unwrap();
    graph
}

#[test]
fn basic_insertion_and_traversal() {
    let graph = grid_graph();
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 4);

    let mut seen = BTreeSet::new();
    for edge in graph.edges(0) {
        let edge = edge.unwrap();
        let expected = match edge.node() {
            1 => 5.0,
            2 => 3.0,
            other => panic!("unexpected neighbor {other}"),
        };
        assert_eq!(edge.distance(), expected);
        assert_eq!(edge.base_node(), 0);
        seen.insert(edge.node());
    }
    assert_eq!(seen, BTreeSet::from([1, 2]));

    assert_eq!(neighbor_set(graph.outgoing(2)), BTreeSet::from([0, 3]));
    // The one-way edge 2->3 is invisible when leaving 3 but shows up as
    // incoming, alongside the bidirectional edge to 4.
    assert_eq!(neighbor_set(graph.outgoing(3)), BTreeSet::from([4]));
    assert_eq!(neighbor_set(graph.incoming(3)), BTreeSet::from([2, 4]));
}

#[test]
fn every_edge_appears_once_per_endpoint() {
    let graph = grid_graph();
    let inserted = [(0, 1), (0, 2), (2, 3), (3, 4)];
    for node in 0..graph.node_count() {
        let expected = inserted
            .iter()
            .filter(|(a, b)| *a == node || *b == node)
            .count();
        assert_eq!(graph.edges(node).count(), expected, "node {node}");
    }
}

#[test]
fn swap_on_insert_canonicalizes_endpoints() {
    let mut graph: RoadGraph = RoadGraph::new(8);
    let one_way = CarFlags::flags(80, false);
    graph.edge(5, 2, 10.0, one_way).unwrap();

    let records: Vec<_> = graph.all_edges().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].node_a(), 2);
    assert_eq!(records[0].node_b(), 5);
    assert_eq!(records[0].flags(), CarFlags::swap_direction(one_way));
    assert_eq!(records[0].distance(), 10.0);

    // From 5 the edge still reads as forward; from 2 it is incoming only.
    assert_eq!(neighbor_set(graph.outgoing(5)), BTreeSet::from([2]));
    assert!(graph.outgoing(2).next().is_none());
    assert_eq!(neighbor_set(graph.incoming(2)), BTreeSet::from([5]));
}

#[test]
fn self_loop_yields_once() {
    let mut graph: RoadGraph = RoadGraph::new(8);
    graph.edge(7, 7, 4.0, CarFlags::default_flags(true)).unwrap();

    let edges: Vec<_> = graph.edges(7).map(|edge| edge.unwrap()).collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].node(), 7);
    assert_eq!(edges[0].distance(), 4.0);
}

#[test]
fn bounds_cover_all_set_nodes() {
    let graph = grid_graph();
    let bounds = graph.bounds();
    for i in 0..graph.node_count() {
        assert!(bounds.contains(graph.latitude(i), graph.longitude(i)));
    }
    assert!(!bounds.contains(0.0, 0.0));
}

#[test]
fn segment_growth_keeps_edges_reachable() {
    let mut graph: RoadGraph = RoadGraph::with_capacity(10, 10);
    assert_eq!(graph.segment_count(), 1);

    for i in 0..3000usize {
        graph
            .edge(i, i + 1, 1.5, CarFlags::default_flags(true))
            .unwrap();
    }

    assert!(graph.segment_count() >= 3);
    assert_eq!(graph.edge_count(), 3000);
    assert_eq!(graph.all_edges().count(), 3000);

    // Interior nodes of the chain still see both neighbors.
    for node in [1usize, 1170, 1171, 2342, 2999] {
        assert_eq!(
            neighbor_set(graph.edges(node)),
            BTreeSet::from([node - 1, node + 1]),
            "node {node}"
        );
    }
}

#[test]
fn overlong_adjacency_list_is_corruption() {
    let mut graph: RoadGraph = RoadGraph::new(8);
    for i in 0..1001usize {
        graph
            .edge(0, i + 1, 1.0, CarFlags::default_flags(true))
            .unwrap();
    }
    match graph.edge(0, 5000, 1.0, CarFlags::default_flags(true)) {
        Err(GraphError::Corruption(_)) => {}
        other => panic!("expected corruption error, got {other:?}"),
    }
}

#[test]
fn implicit_nodes_from_edge_insertion() {
    let mut graph: RoadGraph = RoadGraph::new(2);
    graph.edge(8, 3, 2.5, CarFlags::default_flags(true)).unwrap();
    assert_eq!(graph.node_count(), 9);
    assert_eq!(neighbor_set(graph.edges(3)), BTreeSet::from([8]));
}
