//! Loading a graph together with its training labels

use std::path::Path;

use tracing::info;

use crate::areadata::AreaId;
use crate::graph::{GraphBackend, IndexedGraph, NodeIdx, Result};

/// A loaded graph with the labeled nodes as indices and their labels.
pub struct Dataset {
    pub graph: Box<dyn IndexedGraph>,
    /// Labeled node indices in label-list order
    pub x: Vec<NodeIdx>,
    /// Labels parallel to `x`
    pub y: Vec<AreaId>,
}

impl Dataset {
    /// Number of labeled nodes
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Load an edge list and a label list with the chosen backend
pub fn load_dataset(
    edgelist: &Path,
    labellist: &Path,
    backend: GraphBackend,
    delimiter: char,
) -> Result<Dataset> {
    let graph = backend.load(edgelist, labellist, delimiter)?;
    let x = graph.labeled_indices()?;
    let y = graph.labels().to_vec();
    info!("Dataset has {} labeled nodes", x.len());
    Ok(Dataset { graph, x, y })
}
