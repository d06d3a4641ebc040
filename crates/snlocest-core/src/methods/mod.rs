//! Neighbor-Based Location Inference
//!
//! Every method here predicts a node's area from the areas of its labeled
//! out-neighbors. Training produces an immutable [`FitResult`]; prediction
//! walks the query nodes, gathers each [`Neighborhood`] from the graph and
//! asks the method to [`select`](NeighborsBasedMethod::select) an area.
//!
//! A node with no labeled neighbor gets [`AreaId::NONE`], never an error.

mod geometric_median;
mod majority_vote;
mod nearest_neighbor;
mod probability_model;
mod random_neighbor;
mod registry;

pub use geometric_median::GeometricMedian;
pub use majority_vote::{MajorityVote, VoteFilter};
pub use nearest_neighbor::NearestNeighbor;
pub use probability_model::{
    EdgeProbability, NaiveProbabilityModel, ProbabilityModel, DEFAULT_A, DEFAULT_B, DEFAULT_C,
    METERS_PER_MILE,
};
pub use random_neighbor::RandomNeighbor;
pub use registry::{MethodKind, MethodParams, MethodSpec};

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::areadata::AreaId;
use crate::distance::DistanceError;
use crate::evaluate;
use crate::graph::{GraphError, IndexedGraph, NodeIdx};

/// Nodes between progress log lines during prediction
const PROGRESS_INTERVAL: usize = 10_000;

/// Errors from fitting, building or running a method
#[derive(Debug, Error)]
pub enum MethodError {
    #[error("{0}")]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Distance(#[from] DistanceError),

    #[error("got {nodes} nodes but {labels} labels")]
    LengthMismatch { nodes: usize, labels: usize },

    #[error("method '{0}' needs an area distance metric")]
    MissingMetric(&'static str),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("estimator has not been fitted")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, MethodError>;

// ============================================================================
// Training data
// ============================================================================

/// How often each area occurs in the training labels.
///
/// A count, not a probability. Iteration is in area order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AreaFrequency {
    counts: BTreeMap<AreaId, u64>,
    total: u64,
}

impl AreaFrequency {
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a AreaId>,
    {
        let mut freq = Self::default();
        for &area in labels {
            *freq.counts.entry(area).or_insert(0) += 1;
            freq.total += 1;
        }
        freq
    }

    /// Occurrences of `area` (0 when unseen)
    pub fn count(&self, area: AreaId) -> u64 {
        self.counts.get(&area).copied().unwrap_or(0)
    }

    pub fn probability(&self, area: AreaId) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(area) as f64 / self.total as f64
        }
    }

    /// `(area, count)` pairs in area order
    pub fn iter(&self) -> impl Iterator<Item = (AreaId, u64)> + '_ {
        self.counts.iter().map(|(&a, &c)| (a, c))
    }

    /// Number of distinct areas
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of labels counted
    pub fn total(&self) -> u64 {
        self.total
    }
}

static NEXT_FIT_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable training state shared by every method.
#[derive(Debug, Clone)]
pub struct FitResult {
    id: u64,
    labels: HashMap<NodeIdx, AreaId>,
    frequency: AreaFrequency,
}

impl FitResult {
    /// Build training state from parallel node/label slices.
    ///
    /// `AreaId::NONE` labels are treated as unlabeled and skipped.
    pub fn new(x: &[NodeIdx], y: &[AreaId]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(MethodError::LengthMismatch {
                nodes: x.len(),
                labels: y.len(),
            });
        }
        let mut labels = HashMap::with_capacity(x.len());
        for (&node, &area) in x.iter().zip(y) {
            if !area.is_none() {
                labels.insert(node, area);
            }
        }
        let frequency = AreaFrequency::from_labels(y.iter().filter(|a| !a.is_none()));
        info!("Fitted with {} labels over {} areas", labels.len(), frequency.len());
        Ok(Self {
            id: NEXT_FIT_ID.fetch_add(1, Ordering::Relaxed),
            labels,
            frequency,
        })
    }

    /// Process-unique id of this fit
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self, node: NodeIdx) -> Option<AreaId> {
        self.labels.get(&node).copied()
    }

    pub fn frequency(&self) -> &AreaFrequency {
        &self.frequency
    }

    /// Number of labeled training nodes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(node, area)` pairs in no particular order
    pub fn labeled(&self) -> impl Iterator<Item = (NodeIdx, AreaId)> + '_ {
        self.labels.iter().map(|(&n, &a)| (n, a))
    }
}

// ============================================================================
// Prediction
// ============================================================================

/// A query node with its out-neighbors and their training labels.
#[derive(Debug, Clone, Copy)]
pub struct Neighborhood<'a> {
    pub node: NodeIdx,
    pub neighbors: &'a [NodeIdx],
    /// Parallel to `neighbors`; `None` for unlabeled neighbors
    pub locations: &'a [Option<AreaId>],
}

impl<'a> Neighborhood<'a> {
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    /// Areas of labeled neighbors, in neighbor order with repeats
    pub fn labeled_areas(&self) -> Vec<AreaId> {
        self.locations.iter().flatten().copied().collect()
    }

    /// `(area, votes)` in order of first appearance
    pub fn votes(&self) -> Vec<(AreaId, u64)> {
        let mut position: HashMap<AreaId, usize> = HashMap::new();
        let mut votes: Vec<(AreaId, u64)> = Vec::new();
        for &area in self.locations.iter().flatten() {
            match position.get(&area) {
                Some(&i) => votes[i].1 += 1,
                None => {
                    position.insert(area, votes.len());
                    votes.push((area, 1));
                }
            }
        }
        votes
    }
}

/// Method-specific diagnostics attached to an estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detail {
    None,
    /// Votes for the winning area
    Votes { count: u64 },
    /// Distance in meters from the node's own area to the chosen one
    Distance { meters: Option<f64> },
    Likelihood {
        score: f64,
        neighbor_term: f64,
        normalizer: f64,
    },
}

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub area: AreaId,
    /// Out-degree of the query node, with multiplicity
    pub degree: usize,
    /// Out-neighbors that carry a training label
    pub labeled_degree: usize,
    pub detail: Detail,
}

impl Estimate {
    pub fn new(area: AreaId, hood: &Neighborhood<'_>, labeled_degree: usize, detail: Detail) -> Self {
        Self {
            area,
            degree: hood.degree(),
            labeled_degree,
            detail,
        }
    }

    /// Fields written after the area by result writers
    pub fn diagnostic_fields(&self) -> Vec<String> {
        let mut fields = vec![self.degree.to_string(), self.labeled_degree.to_string()];
        match &self.detail {
            Detail::None => {}
            Detail::Votes { count } => fields.push(count.to_string()),
            Detail::Distance { meters } => {
                fields.push(meters.map(|m| m.to_string()).unwrap_or_default())
            }
            Detail::Likelihood {
                score,
                neighbor_term,
                normalizer,
            } => {
                fields.push(score.to_string());
                fields.push(neighbor_term.to_string());
                fields.push(normalizer.to_string());
            }
        }
        fields
    }
}

/// A rule that picks an area from a neighborhood.
pub trait NeighborsBasedMethod: Send {
    /// Short registry name
    fn name(&self) -> &'static str;

    fn select(&mut self, hood: &Neighborhood<'_>, fit: &FitResult) -> Result<Estimate>;
}

/// Run `method` over every node in `x`, in order.
pub fn predict<G>(
    graph: &G,
    method: &mut dyn NeighborsBasedMethod,
    fit: &FitResult,
    x: &[NodeIdx],
) -> Result<Vec<Estimate>>
where
    G: IndexedGraph + ?Sized,
{
    let mut estimates = Vec::with_capacity(x.len());
    let mut locations = Vec::new();
    for (i, &node) in x.iter().enumerate() {
        if i % PROGRESS_INTERVAL == 0 {
            debug!("Inferred {} nodes out of {}", i, x.len());
        }
        let neighbors = graph.row(node)?;
        locations.clear();
        locations.extend(neighbors.iter().map(|&n| fit.label(n)));
        let hood = Neighborhood {
            node,
            neighbors: &neighbors,
            locations: &locations,
        };
        estimates.push(method.select(&hood, fit)?);
    }
    Ok(estimates)
}

/// Graph, method and most recent fit bundled together.
pub struct Estimator<'g, G: IndexedGraph + ?Sized> {
    graph: &'g G,
    method: Box<dyn NeighborsBasedMethod>,
    fit: Option<FitResult>,
    results: Vec<Estimate>,
}

impl<'g, G: IndexedGraph + ?Sized> Estimator<'g, G> {
    pub fn new(graph: &'g G, method: Box<dyn NeighborsBasedMethod>) -> Self {
        Self {
            graph,
            method,
            fit: None,
            results: Vec::new(),
        }
    }

    /// Replace the training state
    pub fn fit(&mut self, x: &[NodeIdx], y: &[AreaId]) -> Result<&mut Self> {
        self.fit = Some(FitResult::new(x, y)?);
        Ok(self)
    }

    pub fn fit_result(&self) -> Option<&FitResult> {
        self.fit.as_ref()
    }

    /// Predict full estimates and keep them for [`Estimator::results`]
    pub fn predict_detailed(&mut self, x: &[NodeIdx]) -> Result<&[Estimate]> {
        let fit = self.fit.as_ref().ok_or(MethodError::NotFitted)?;
        self.results = predict(self.graph, self.method.as_mut(), fit, x)?;
        Ok(&self.results)
    }

    /// Predict areas only
    pub fn predict(&mut self, x: &[NodeIdx]) -> Result<Vec<AreaId>> {
        Ok(self.predict_detailed(x)?.iter().map(|e| e.area).collect())
    }

    /// Estimates from the last prediction
    pub fn results(&self) -> &[Estimate] {
        &self.results
    }

    /// Exact-match accuracy of predictions on `x` against `y`
    pub fn score(&mut self, x: &[NodeIdx], y: &[AreaId]) -> Result<f64> {
        if x.len() != y.len() {
            return Err(MethodError::LengthMismatch {
                nodes: x.len(),
                labels: y.len(),
            });
        }
        let predicted = self.predict(x)?;
        Ok(evaluate::accuracy(y, &predicted))
    }

    pub fn method_name(&self) -> &'static str {
        self.method.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CsrGraph, Graph};

    pub(crate) fn hood<'a>(
        neighbors: &'a [NodeIdx],
        locations: &'a [Option<AreaId>],
    ) -> Neighborhood<'a> {
        Neighborhood {
            node: 0,
            neighbors,
            locations,
        }
    }

    #[test]
    fn test_area_frequency() {
        let labels = [AreaId(2), AreaId(1), AreaId(2)];
        let freq = AreaFrequency::from_labels(&labels);
        assert_eq!(freq.count(AreaId(2)), 2);
        assert_eq!(freq.count(AreaId(9)), 0);
        assert_eq!(freq.total(), 3);
        assert!((freq.probability(AreaId(1)) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(
            freq.iter().collect::<Vec<_>>(),
            vec![(AreaId(1), 1), (AreaId(2), 2)]
        );
    }

    #[test]
    fn test_fit_skips_none_labels() {
        let fit = FitResult::new(&[0, 1, 2], &[AreaId(5), AreaId::NONE, AreaId(5)]).unwrap();
        assert_eq!(fit.len(), 2);
        assert_eq!(fit.label(1), None);
        assert_eq!(fit.frequency().count(AreaId(5)), 2);
        assert_eq!(fit.frequency().count(AreaId::NONE), 0);
    }

    #[test]
    fn test_fit_length_mismatch() {
        assert!(matches!(
            FitResult::new(&[0, 1], &[AreaId(1)]),
            Err(MethodError::LengthMismatch { nodes: 2, labels: 1 })
        ));
    }

    #[test]
    fn test_fit_ids_are_unique() {
        let a = FitResult::new(&[], &[]).unwrap();
        let b = FitResult::new(&[], &[]).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_votes_in_first_seen_order() {
        let locations = [Some(AreaId(3)), None, Some(AreaId(1)), Some(AreaId(3))];
        let h = hood(&[1, 2, 3, 4], &locations);
        assert_eq!(h.votes(), vec![(AreaId(3), 2), (AreaId(1), 1)]);
        assert_eq!(h.labeled_areas(), vec![AreaId(3), AreaId(1), AreaId(3)]);
        assert_eq!(h.degree(), 4);
    }

    #[test]
    fn test_diagnostic_fields() {
        let locations = [None];
        let h = hood(&[1], &locations);
        let e = Estimate::new(AreaId(1), &h, 0, Detail::Votes { count: 4 });
        assert_eq!(e.diagnostic_fields(), vec!["1", "0", "4"]);

        let e = Estimate::new(AreaId::NONE, &h, 0, Detail::Distance { meters: None });
        assert_eq!(e.diagnostic_fields(), vec!["1", "0", ""]);
    }

    #[test]
    fn test_estimator_end_to_end() {
        let mut graph = CsrGraph::from_edges([("u1", "u2"), ("u2", "u3")]).unwrap();
        graph
            .set_labels(vec!["u2".to_string()], vec![AreaId(7)])
            .unwrap();
        let x = graph.labeled_indices().unwrap();
        let y = graph.labels().to_vec();

        let mut est = Estimator::new(&graph, Box::new(MajorityVote::default()));
        assert!(matches!(est.predict(&[0]), Err(MethodError::NotFitted)));

        est.fit(&x, &y).unwrap();
        let u1 = graph.index_of("u1").unwrap();
        let results = est.predict_detailed(&[u1]).unwrap();
        assert_eq!(results[0].area, AreaId(7));
        assert_eq!(results[0].degree, 1);
        assert_eq!(results[0].labeled_degree, 1);
        assert_eq!(results[0].detail, Detail::Votes { count: 1 });
        assert_eq!(est.results().len(), 1);

        let u3 = graph.index_of("u3").unwrap();
        assert_eq!(est.predict(&[u3]).unwrap(), vec![AreaId::NONE]);
        assert_eq!(est.score(&[u1], &[AreaId(7)]).unwrap(), 1.0);
        assert_eq!(est.method_name(), "mv");
    }
}
