//! Compressed sparse row graph
//!
//! The node table is the sorted set of edge endpoints, followed by labeled
//! nodes that never appear in an edge. Loading labels replaces that tail. Row `i` is
//! `targets[offsets[i]..offsets[i + 1]]`, sorted, parallel edges kept.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, info};

use super::{check_labels, to_idx, Graph, GraphError, IndexedGraph, NodeIdx, Result};
use crate::areadata::AreaId;
use crate::dsv;

/// Directed multigraph in CSR layout.
#[derive(Debug, Clone)]
pub struct CsrGraph {
    names: Vec<String>,
    /// Rows before this index are edge endpoints
    edge_nodes: usize,
    index: HashMap<String, NodeIdx>,
    /// `names.len() + 1` row boundaries into `targets`
    offsets: Vec<usize>,
    targets: Vec<NodeIdx>,
    labeled_nodes: Vec<String>,
    labels: Vec<AreaId>,
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrGraph {
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            edge_nodes: 0,
            index: HashMap::new(),
            offsets: vec![0],
            targets: Vec::new(),
            labeled_nodes: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Build a graph from in-memory `(src, dst)` pairs
    pub fn from_edges<I, S>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        graph.build(edges.into_iter().map(|(s, d)| (s.into(), d.into())).collect())?;
        Ok(graph)
    }

    fn build(&mut self, edges: Vec<(String, String)>) -> Result<()> {
        let endpoints: BTreeSet<&str> = edges
            .iter()
            .flat_map(|(s, d)| [s.as_str(), d.as_str()])
            .collect();

        let names: Vec<String> = endpoints.into_iter().map(str::to_string).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (pos, name) in names.iter().enumerate() {
            index.insert(name.clone(), to_idx(pos)?);
        }

        let mut offsets = vec![0usize; names.len() + 1];
        let mut pairs = Vec::with_capacity(edges.len());
        for (src, dst) in &edges {
            // Both endpoints are in the table built above
            let (Some(&s), Some(&d)) = (index.get(src), index.get(dst)) else {
                return Err(GraphError::UnknownNode(src.clone()));
            };
            offsets[s as usize + 1] += 1;
            pairs.push((s, d));
        }
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        let mut cursor = offsets.clone();
        let mut targets = vec![0; pairs.len()];
        for (s, d) in pairs {
            let slot = &mut cursor[s as usize];
            targets[*slot] = d;
            *slot += 1;
        }
        for i in 0..names.len() {
            targets[offsets[i]..offsets[i + 1]].sort_unstable();
        }

        self.edge_nodes = names.len();
        self.names = names;
        self.index = index;
        self.offsets = offsets;
        self.targets = targets;
        self.append_labeled_nodes()
    }

    /// Replace the label-only tail with the current labeled nodes missing
    /// from the edge endpoints
    fn append_labeled_nodes(&mut self) -> Result<()> {
        for name in self.names.drain(self.edge_nodes..) {
            self.index.remove(&name);
        }
        self.offsets.truncate(self.edge_nodes + 1);

        let end = self.targets.len();
        let mut appended = 0usize;
        for node in &self.labeled_nodes {
            if self.index.contains_key(node) {
                continue;
            }
            let idx = to_idx(self.names.len())?;
            self.index.insert(node.clone(), idx);
            self.names.push(node.clone());
            self.offsets.push(end);
            appended += 1;
        }
        if appended > 0 {
            debug!("Appended {} label-only nodes to CSR table", appended);
        }
        Ok(())
    }

    fn row_slice(&self, idx: NodeIdx) -> Result<&[NodeIdx]> {
        let i = idx as usize;
        if i >= self.names.len() {
            return Err(GraphError::UnknownIndex(idx));
        }
        Ok(&self.targets[self.offsets[i]..self.offsets[i + 1]])
    }
}

impl Graph for CsrGraph {
    fn load_edgelist(&mut self, path: &Path, delimiter: char) -> Result<()> {
        let edges: Vec<(String, String)> =
            dsv::read_edgelist(path, delimiter)?.collect::<dsv::Result<_>>()?;
        self.build(edges)?;
        info!(
            "Loaded CSR graph from {:?}: {} nodes, {} edges",
            path,
            self.names.len(),
            self.targets.len()
        );
        Ok(())
    }

    fn set_labels(&mut self, nodes: Vec<String>, labels: Vec<AreaId>) -> Result<()> {
        check_labels(&nodes, &labels)?;
        self.labeled_nodes = nodes;
        self.labels = labels;
        self.append_labeled_nodes()
    }

    fn nodes(&self) -> &[String] {
        &self.names
    }

    fn num_edges(&self) -> usize {
        self.targets.len()
    }

    fn neighbors(&self, node: &str) -> Result<Vec<&str>> {
        let row = self.row_slice(self.index_of(node)?)?;
        Ok(row.iter().map(|&t| self.names[t as usize].as_str()).collect())
    }

    fn labeled_nodes(&self) -> &[String] {
        &self.labeled_nodes
    }

    fn labels(&self) -> &[AreaId] {
        &self.labels
    }

    fn contains_node(&self, node: &str) -> bool {
        self.index.contains_key(node)
    }
}

impl IndexedGraph for CsrGraph {
    fn index_of(&self, node: &str) -> Result<NodeIdx> {
        self.index
            .get(node)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(node.to_string()))
    }

    fn name_of(&self, idx: NodeIdx) -> Result<&str> {
        self.names
            .get(idx as usize)
            .map(String::as_str)
            .ok_or(GraphError::UnknownIndex(idx))
    }

    fn row(&self, idx: NodeIdx) -> Result<Cow<'_, [NodeIdx]>> {
        self.row_slice(idx).map(Cow::Borrowed)
    }
}
