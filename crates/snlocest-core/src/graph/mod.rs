//! Social Graph Representations
//!
//! Two interchangeable in-memory representations of a directed, unweighted
//! multigraph of users, loaded from an edge list and a label list:
//!
//! - [`CsrGraph`]: compressed sparse rows. Slower to load, fast and compact
//!   neighbor queries.
//! - [`AdjacencyListGraph`]: sharded map of adjacency lists. Streams the edge
//!   list without a global sort.
//!
//! [`IndexedAdjacencyGraph`] puts an index table over the adjacency-list
//! graph so both backends answer the same [`IndexedGraph`] queries.
//!
//! The node set is always the union of every edge endpoint and every
//! labeled node. A node outside that set is an error, not an empty result.

mod adjacency;
mod csr;
mod indexed;

pub use adjacency::AdjacencyListGraph;
pub use csr::CsrGraph;
pub use indexed::IndexedAdjacencyGraph;

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::areadata::AreaId;
use crate::dsv::{self, DsvError};

/// Dense internal node index in `0..num_nodes`
pub type NodeIdx = u32;

/// Errors from graph loading and lookup
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("unknown node index: {0}")]
    UnknownIndex(NodeIdx),

    #[error("graph has {0} nodes, more than a u32 index can address")]
    TooManyNodes(usize),

    #[error("label list has {nodes} nodes but {labels} labels")]
    LabelMismatch { nodes: usize, labels: usize },

    #[error("unknown graph backend: {0}")]
    UnknownBackend(String),

    #[error("{0}")]
    Dsv(Box<DsvError>),
}

impl From<DsvError> for GraphError {
    fn from(err: DsvError) -> Self {
        GraphError::Dsv(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Node and neighbor queries shared by every representation.
///
/// Graphs are read-only after loading and are shared across folds, hence
/// the `Send + Sync` bound.
pub trait Graph: Send + Sync {
    /// Replace the edge set with the contents of an edge list
    fn load_edgelist(&mut self, path: &Path, delimiter: char) -> Result<()>;

    /// Replace the label list with the given parallel vectors
    fn set_labels(&mut self, nodes: Vec<String>, labels: Vec<AreaId>) -> Result<()>;

    /// Read a label list and merge its nodes into the node set
    fn load_labellist(&mut self, path: &Path, delimiter: char) -> Result<()> {
        let (nodes, labels) = dsv::read_labellist(path, delimiter)?;
        info!("Loaded {} labels from {:?}", nodes.len(), path);
        self.set_labels(nodes, labels)
    }

    /// All node ids
    fn nodes(&self) -> &[String];

    fn num_nodes(&self) -> usize {
        self.nodes().len()
    }

    /// Number of edges, counting parallel edges separately
    fn num_edges(&self) -> usize;

    /// Out-neighbors of `node`, with multiplicity
    fn neighbors(&self, node: &str) -> Result<Vec<&str>>;

    /// Labeled node ids in label-list order
    fn labeled_nodes(&self) -> &[String];

    /// Labels parallel to [`Graph::labeled_nodes`]
    fn labels(&self) -> &[AreaId];

    fn contains_node(&self, node: &str) -> bool;
}

/// Index-based access over a [`Graph`].
pub trait IndexedGraph: Graph {
    fn index_of(&self, node: &str) -> Result<NodeIdx>;

    fn name_of(&self, idx: NodeIdx) -> Result<&str>;

    /// Out-neighbor indices of `idx`, with multiplicity
    fn row(&self, idx: NodeIdx) -> Result<Cow<'_, [NodeIdx]>>;

    fn indices_of(&self, nodes: &[String]) -> Result<Vec<NodeIdx>> {
        nodes.iter().map(|n| self.index_of(n)).collect()
    }

    /// Indices of the labeled nodes, parallel to [`Graph::labels`]
    fn labeled_indices(&self) -> Result<Vec<NodeIdx>> {
        self.indices_of(self.labeled_nodes())
    }
}

/// Checked conversion of a table position to a [`NodeIdx`]
pub(crate) fn to_idx(position: usize) -> Result<NodeIdx> {
    NodeIdx::try_from(position).map_err(|_| GraphError::TooManyNodes(position + 1))
}

pub(crate) fn check_labels(nodes: &[String], labels: &[AreaId]) -> Result<()> {
    if nodes.len() != labels.len() {
        return Err(GraphError::LabelMismatch {
            nodes: nodes.len(),
            labels: labels.len(),
        });
    }
    Ok(())
}

// ============================================================================
// Backend selection
// ============================================================================

/// Concrete graph representation to load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphBackend {
    /// Compressed sparse rows
    #[default]
    Csr,
    /// Sharded adjacency lists with an index adapter
    AdjacencyList,
}

impl GraphBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphBackend::Csr => "csr",
            GraphBackend::AdjacencyList => "adjacency-list",
        }
    }

    /// Load an edge list then a label list into a fresh graph
    pub fn load(
        self,
        edgelist: &Path,
        labellist: &Path,
        delimiter: char,
    ) -> Result<Box<dyn IndexedGraph>> {
        let mut graph: Box<dyn IndexedGraph> = match self {
            GraphBackend::Csr => Box::new(CsrGraph::new()),
            GraphBackend::AdjacencyList => Box::new(IndexedAdjacencyGraph::new()),
        };
        graph.load_edgelist(edgelist, delimiter)?;
        graph.load_labellist(labellist, delimiter)?;
        info!(
            "Graph ({}) ready: {} nodes, {} edges, {} labeled",
            self.as_str(),
            graph.num_nodes(),
            graph.num_edges(),
            graph.labeled_nodes().len()
        );
        Ok(graph)
    }
}

impl fmt::Display for GraphBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphBackend {
    type Err = GraphError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csr" => Ok(GraphBackend::Csr),
            "adjacency-list" | "adjacency" | "dol" => Ok(GraphBackend::AdjacencyList),
            other => Err(GraphError::UnknownBackend(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("csr".parse::<GraphBackend>().unwrap(), GraphBackend::Csr);
        assert_eq!(
            "adjacency-list".parse::<GraphBackend>().unwrap(),
            GraphBackend::AdjacencyList
        );
        assert_eq!("DOL".parse::<GraphBackend>().unwrap(), GraphBackend::AdjacencyList);
        assert!("petgraph".parse::<GraphBackend>().is_err());
    }

    #[test]
    fn test_backend_display_round_trip() {
        for backend in [GraphBackend::Csr, GraphBackend::AdjacencyList] {
            assert_eq!(backend.to_string().parse::<GraphBackend>().unwrap(), backend);
        }
    }

    #[test]
    fn test_check_labels() {
        assert!(check_labels(&["a".to_string()], &[AreaId(1)]).is_ok());
        assert!(matches!(
            check_labels(&["a".to_string()], &[]),
            Err(GraphError::LabelMismatch { nodes: 1, labels: 0 })
        ));
    }
}
