//! Index adapter over the adjacency-list graph

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use super::{to_idx, AdjacencyListGraph, Graph, GraphError, IndexedGraph, NodeIdx, Result};
use crate::areadata::AreaId;

/// [`AdjacencyListGraph`] with a name-to-index table.
///
/// Indices are positions in the sorted node set and are rebuilt after every
/// load.
#[derive(Debug, Default)]
pub struct IndexedAdjacencyGraph {
    inner: AdjacencyListGraph,
    index: HashMap<String, NodeIdx>,
}

impl IndexedAdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already loaded adjacency-list graph
    pub fn from_graph(inner: AdjacencyListGraph) -> Result<Self> {
        let mut graph = Self {
            inner,
            index: HashMap::new(),
        };
        graph.rebuild_index()?;
        Ok(graph)
    }

    fn rebuild_index(&mut self) -> Result<()> {
        let nodes = self.inner.nodes();
        let mut index = HashMap::with_capacity(nodes.len());
        for (pos, name) in nodes.iter().enumerate() {
            index.insert(name.clone(), to_idx(pos)?);
        }
        self.index = index;
        Ok(())
    }

    pub fn inner(&self) -> &AdjacencyListGraph {
        &self.inner
    }
}

impl Graph for IndexedAdjacencyGraph {
    fn load_edgelist(&mut self, path: &Path, delimiter: char) -> Result<()> {
        self.inner.load_edgelist(path, delimiter)?;
        self.rebuild_index()
    }

    fn set_labels(&mut self, nodes: Vec<String>, labels: Vec<AreaId>) -> Result<()> {
        self.inner.set_labels(nodes, labels)?;
        self.rebuild_index()
    }

    fn nodes(&self) -> &[String] {
        self.inner.nodes()
    }

    fn num_edges(&self) -> usize {
        self.inner.num_edges()
    }

    fn neighbors(&self, node: &str) -> Result<Vec<&str>> {
        self.inner.neighbors(node)
    }

    fn labeled_nodes(&self) -> &[String] {
        self.inner.labeled_nodes()
    }

    fn labels(&self) -> &[AreaId] {
        self.inner.labels()
    }

    fn contains_node(&self, node: &str) -> bool {
        self.index.contains_key(node)
    }
}

impl IndexedGraph for IndexedAdjacencyGraph {
    fn index_of(&self, node: &str) -> Result<NodeIdx> {
        self.index
            .get(node)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(node.to_string()))
    }

    fn name_of(&self, idx: NodeIdx) -> Result<&str> {
        self.inner
            .nodes()
            .get(idx as usize)
            .map(String::as_str)
            .ok_or(GraphError::UnknownIndex(idx))
    }

    fn row(&self, idx: NodeIdx) -> Result<Cow<'_, [NodeIdx]>> {
        let name = self.name_of(idx)?;
        let row = self
            .inner
            .neighbors(name)?
            .into_iter()
            .map(|n| self.index_of(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(Cow::Owned(row))
    }
}
