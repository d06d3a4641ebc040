//! snlocest Core - Home-location inference from social-graph neighbors
//!
//! This crate provides the core functionality for location inference:
//! - Sharded hash map for very large key sets
//! - CSR and adjacency-list graph representations with shared traits
//! - Edge-list, label-list and result-file I/O
//! - Memoized geodesic distance between areas
//! - Neighbor-based inference methods (majority vote, geometric median,
//!   random neighbor, nearest neighbor, probability model)
//! - K-fold and leave-one-out cross-validation with precision/recall/F1

pub mod areadata;
pub mod crossval;
pub mod dataset;
pub mod distance;
pub mod dsv;
pub mod evaluate;
pub mod graph;
pub mod largemap;
pub mod methods;

// Re-exports for convenience
pub use areadata::{AreaCoordinateData, AreaDataError, AreaId};
pub use dataset::{load_dataset, Dataset};
pub use distance::{
    AreaDistance, AreaMetric, CacheInfo, DistanceCache, DistanceError, DistanceFormula, Point,
    DEFAULT_CACHE_CAPACITY,
};
pub use dsv::{read_edgelist, read_labellist, read_result, write_result, DsvError};
pub use graph::{
    AdjacencyListGraph, CsrGraph, Graph, GraphBackend, GraphError, IndexedAdjacencyGraph,
    IndexedGraph, NodeIdx,
};
pub use largemap::ShardedMap;

// Inference re-exports
pub use methods::{
    predict, AreaFrequency, Detail, EdgeProbability, Estimate, Estimator, FitResult, MethodError,
    MethodKind, MethodParams, MethodSpec, NaiveProbabilityModel, Neighborhood,
    NeighborsBasedMethod, VoteFilter,
};

// Evaluation re-exports
pub use crossval::{
    loo_fast, CrossValError, CrossValidator, FoldOutcome, KFold, Splitter, DEFAULT_N_SPLITS,
    DEFAULT_RANDOM_STATE,
};
pub use evaluate::{accuracy, PrfScore};
