//! Adjacency-list graph over a sharded map
//!
//! Edges stream straight into per-source lists. The node set is derived
//! lazily on first use and dropped whenever new data is loaded.

use std::path::Path;

use once_cell::sync::OnceCell;
use tracing::info;

use super::{check_labels, Graph, GraphError, Result};
use crate::areadata::AreaId;
use crate::dsv;
use crate::largemap::ShardedMap;

/// Directed multigraph stored as `source -> [destinations]`.
#[derive(Debug, Default)]
pub struct AdjacencyListGraph {
    adjacency: ShardedMap<String, Vec<String>>,
    num_edges: usize,
    labeled_nodes: Vec<String>,
    labels: Vec<AreaId>,
    /// Sorted union of sources, destinations and labeled nodes
    node_set: OnceCell<Vec<String>>,
}

impl AdjacencyListGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from in-memory `(src, dst)` pairs
    pub fn from_edges<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for (src, dst) in edges {
            graph.push_edge(src.into(), dst.into());
        }
        graph
    }

    fn push_edge(&mut self, src: String, dst: String) {
        self.adjacency.get_or_insert_with(src, Vec::new).push(dst);
        self.num_edges += 1;
    }

    fn invalidate(&mut self) {
        self.node_set = OnceCell::new();
    }

    fn compute_node_set(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .adjacency
            .iter()
            .flat_map(|(src, dsts)| std::iter::once(src).chain(dsts.iter()))
            .chain(self.labeled_nodes.iter())
            .cloned()
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Number of nodes with at least one outgoing edge
    pub fn num_sources(&self) -> usize {
        self.adjacency.len()
    }
}

impl Graph for AdjacencyListGraph {
    fn load_edgelist(&mut self, path: &Path, delimiter: char) -> Result<()> {
        self.adjacency.clear();
        self.num_edges = 0;
        self.invalidate();
        for edge in dsv::read_edgelist(path, delimiter)? {
            let (src, dst) = edge?;
            self.push_edge(src, dst);
        }
        info!(
            "Loaded adjacency lists from {:?}: {} sources, {} edges",
            path,
            self.adjacency.len(),
            self.num_edges
        );
        Ok(())
    }

    fn set_labels(&mut self, nodes: Vec<String>, labels: Vec<AreaId>) -> Result<()> {
        check_labels(&nodes, &labels)?;
        self.labeled_nodes = nodes;
        self.labels = labels;
        self.invalidate();
        Ok(())
    }

    fn nodes(&self) -> &[String] {
        self.node_set.get_or_init(|| self.compute_node_set())
    }

    fn num_edges(&self) -> usize {
        self.num_edges
    }

    fn neighbors(&self, node: &str) -> Result<Vec<&str>> {
        if let Some(dsts) = self.adjacency.get(node) {
            return Ok(dsts.iter().map(String::as_str).collect());
        }
        if self.contains_node(node) {
            Ok(Vec::new())
        } else {
            Err(GraphError::UnknownNode(node.to_string()))
        }
    }

    fn labeled_nodes(&self) -> &[String] {
        &self.labeled_nodes
    }

    fn labels(&self) -> &[AreaId] {
        &self.labels
    }

    fn contains_node(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
            || self
                .nodes()
                .binary_search_by(|probe| probe.as_str().cmp(node))
                .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_node_set_is_sorted_union() {
        let mut g = AdjacencyListGraph::from_edges([("b", "c"), ("a", "b"), ("a", "b")]);
        assert_eq!(g.nodes(), &["a", "b", "c"]);
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.num_sources(), 2);

        g.set_labels(vec!["0".to_string()], vec![AreaId(5)]).unwrap();
        assert_eq!(g.nodes(), &["0", "a", "b", "c"]);
    }

    #[test]
    fn test_neighbors() {
        let g = AdjacencyListGraph::from_edges([("a", "b"), ("a", "c"), ("a", "b")]);
        assert_eq!(g.neighbors("a").unwrap(), vec!["b", "c", "b"]);
        // Known destination without outgoing edges
        assert!(g.neighbors("c").unwrap().is_empty());
        assert!(matches!(g.neighbors("zz"), Err(GraphError::UnknownNode(_))));
    }

    #[test]
    fn test_labeled_only_node_has_no_neighbors() {
        let mut g = AdjacencyListGraph::from_edges([("a", "b")]);
        assert!(!g.contains_node("solo"));
        g.set_labels(vec!["solo".to_string()], vec![AreaId(3)]).unwrap();
        assert!(g.contains_node("solo"));
        assert!(g.neighbors("solo").unwrap().is_empty());
        assert_eq!(g.labels(), &[AreaId(3)]);
    }
}
