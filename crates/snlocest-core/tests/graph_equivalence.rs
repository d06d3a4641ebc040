//! Equivalence tests for the graph backends
//!
//! The CSR graph and the indexed adjacency-list graph must answer every
//! query identically up to node ordering.

mod common;

use std::collections::BTreeSet;

use common::{edges_path, labels_path, load_fixture};
use pretty_assertions::assert_eq;
use snlocest_core::{
    AdjacencyListGraph, AreaId, CsrGraph, Graph, GraphBackend, GraphError, IndexedGraph,
};

fn sorted_nodes(graph: &dyn IndexedGraph) -> Vec<String> {
    let mut nodes = graph.nodes().to_vec();
    nodes.sort();
    nodes
}

fn sorted_neighbors(graph: &dyn IndexedGraph, node: &str) -> Vec<String> {
    let mut neighbors: Vec<String> = graph
        .neighbors(node)
        .expect("Known node")
        .into_iter()
        .map(str::to_string)
        .collect();
    neighbors.sort();
    neighbors
}

#[test]
fn test_backends_agree_on_counts() {
    let csr = load_fixture(GraphBackend::Csr);
    let dol = load_fixture(GraphBackend::AdjacencyList);

    assert_eq!(csr.num_nodes(), 14);
    assert_eq!(csr.num_nodes(), dol.num_nodes());
    assert_eq!(csr.num_edges(), 27);
    assert_eq!(csr.num_edges(), dol.num_edges());
    assert_eq!(csr.labeled_nodes(), dol.labeled_nodes());
    assert_eq!(csr.labels(), dol.labels());
}

#[test]
fn test_backends_agree_on_node_sets() {
    let csr = load_fixture(GraphBackend::Csr);
    let dol = load_fixture(GraphBackend::AdjacencyList);

    assert_eq!(sorted_nodes(csr.as_ref()), sorted_nodes(dol.as_ref()));

    let nodes: BTreeSet<String> = csr.nodes().iter().cloned().collect();
    assert!(nodes.contains("x99"), "Sink-only endpoint is a node");
    assert!(nodes.contains("solo"), "Label-only node is a node");
}

#[test]
fn test_backends_agree_on_neighbors() {
    let csr = load_fixture(GraphBackend::Csr);
    let dol = load_fixture(GraphBackend::AdjacencyList);

    for node in csr.nodes() {
        assert_eq!(
            sorted_neighbors(csr.as_ref(), node),
            sorted_neighbors(dol.as_ref(), node),
            "Neighbors differ for {}",
            node
        );
    }

    // Parallel edge kept in both
    assert_eq!(sorted_neighbors(csr.as_ref(), "u08"), vec!["u06", "u07", "u07"]);
    assert!(sorted_neighbors(dol.as_ref(), "solo").is_empty());
}

#[test]
fn test_backends_agree_on_rows() {
    let csr = load_fixture(GraphBackend::Csr);
    let dol = load_fixture(GraphBackend::AdjacencyList);

    for node in csr.nodes() {
        let names = |g: &dyn IndexedGraph| -> Vec<String> {
            let idx = g.index_of(node).unwrap();
            assert_eq!(g.name_of(idx).unwrap(), node);
            let mut row: Vec<String> = g
                .row(idx)
                .unwrap()
                .iter()
                .map(|&n| g.name_of(n).unwrap().to_string())
                .collect();
            row.sort();
            row
        };
        assert_eq!(names(csr.as_ref()), names(dol.as_ref()));
    }
}

#[test]
fn test_unknown_node_in_both_backends() {
    for backend in [GraphBackend::Csr, GraphBackend::AdjacencyList] {
        let graph = load_fixture(backend);
        assert!(!graph.contains_node("nobody"));
        assert!(matches!(
            graph.neighbors("nobody"),
            Err(GraphError::UnknownNode(_))
        ));
        assert!(matches!(
            graph.index_of("nobody"),
            Err(GraphError::UnknownNode(_))
        ));
        let past_end = graph.num_nodes() as u32;
        assert!(matches!(
            graph.row(past_end),
            Err(GraphError::UnknownIndex(_))
        ));
    }
}

#[test]
fn test_labels_before_edges() {
    let mut csr = CsrGraph::new();
    csr.load_labellist(&labels_path(), '\t').unwrap();
    assert_eq!(csr.num_nodes(), 11);
    csr.load_edgelist(&edges_path(), '\t').unwrap();

    let mut dol = AdjacencyListGraph::new();
    dol.load_labellist(&labels_path(), '\t').unwrap();
    dol.load_edgelist(&edges_path(), '\t').unwrap();

    assert_eq!(csr.num_nodes(), 14);
    assert_eq!(dol.num_nodes(), 14);
    let mut a = csr.nodes().to_vec();
    a.sort();
    assert_eq!(a, dol.nodes().to_vec());
    assert_eq!(csr.labels()[10], AreaId(27128));
}

#[test]
fn test_backends_agree_after_label_reload() {
    let mut csr = CsrGraph::from_edges([("a", "b")]).unwrap();
    let mut dol = AdjacencyListGraph::from_edges([("a", "b")]);

    for (nodes, expected) in [
        (vec!["solo"], vec!["a", "b", "solo"]),
        (vec!["a"], vec!["a", "b"]),
        (vec!["b", "late"], vec!["a", "b", "late"]),
    ] {
        let names: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
        let labels = vec![AreaId(1); names.len()];
        csr.set_labels(names.clone(), labels.clone()).unwrap();
        dol.set_labels(names, labels).unwrap();

        assert_eq!(csr.nodes(), expected.as_slice());
        assert_eq!(dol.nodes(), expected.as_slice());
        assert_eq!(csr.num_nodes(), dol.num_nodes());
    }
}
