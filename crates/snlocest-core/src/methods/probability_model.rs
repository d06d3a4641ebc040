//! Maximum-likelihood location from a distance-decay edge model
//!
//! Backstrom, Sun and Marlow, "Find Me If You Can", WWW 2010.
//!
//! An edge between two users at distance `d` exists with probability
//! `p(d) = a (d + b)^(-c)`, `d` as returned by the metric, or converted from
//! meters to miles when `distance_in_meters` is set. For a candidate area `l`:
//!
//! ```text
//! score(l) = sum over labeled neighbors v of [ln p(d(l, l_v)) - ln(1 - p(d(l, l_v)))]
//!          + gamma(l)
//! gamma(l) = sum over training areas a of count(a) * ln(1 - p(d(l, a)))
//! ```
//!
//! `gamma` depends only on the fit, so it is memoized per area and dropped
//! whenever a new fit shows up.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    AreaFrequency, Detail, Estimate, FitResult, MethodError, Neighborhood, NeighborsBasedMethod,
    Result,
};
use crate::areadata::AreaId;
use crate::distance::AreaMetric;
use crate::graph::NodeIdx;

pub const DEFAULT_A: f64 = 0.0019;
pub const DEFAULT_B: f64 = 0.196;
pub const DEFAULT_C: f64 = 1.05;
pub const METERS_PER_MILE: f64 = 1609.34;

/// Edge probability as a function of distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeProbability {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Convert distances from meters to miles before applying the curve
    pub distance_in_meters: bool,
}

impl Default for EdgeProbability {
    fn default() -> Self {
        Self {
            a: DEFAULT_A,
            b: DEFAULT_B,
            c: DEFAULT_C,
            distance_in_meters: false,
        }
    }
}

impl EdgeProbability {
    pub fn new(a: f64, b: f64, c: f64, distance_in_meters: bool) -> Result<Self> {
        let model = Self {
            a,
            b,
            c,
            distance_in_meters,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check `a, b, c > 0` and `p(0) < 1`, which keeps every log finite
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("a", self.a), ("b", self.b), ("c", self.c)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(MethodError::InvalidParameter {
                    name,
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }
        let p0 = self.probability(0.0);
        if p0 >= 1.0 {
            return Err(MethodError::InvalidParameter {
                name: "a",
                reason: format!("p(0) = {} must be below 1", p0),
            });
        }
        Ok(())
    }

    /// Probability of an edge at `distance`
    pub fn probability(&self, distance: f64) -> f64 {
        let d = if self.distance_in_meters {
            distance / METERS_PER_MILE
        } else {
            distance
        };
        self.a * (d + self.b).powf(-self.c)
    }

    /// `(ln p, ln(1 - p))` at `distance`
    fn log_terms(&self, distance: f64) -> (f64, f64) {
        let p = self.probability(distance);
        (p.ln(), (-p).ln_1p())
    }
}

/// Likelihood terms for one candidate area
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scored {
    area: AreaId,
    score: f64,
    neighbor_term: f64,
    normalizer: f64,
}

impl Scored {
    fn estimate(self, hood: &Neighborhood<'_>, labeled: usize) -> Estimate {
        Estimate::new(
            self.area,
            hood,
            labeled,
            Detail::Likelihood {
                score: self.score,
                neighbor_term: self.neighbor_term,
                normalizer: self.normalizer,
            },
        )
    }
}

/// Higher score, then more frequent in training, then lower area id, then
/// smaller neighbor term
fn score_order(a: &Scored, b: &Scored, freq: &AreaFrequency) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| freq.count(b.area).cmp(&freq.count(a.area)))
        .then_with(|| a.area.cmp(&b.area))
        .then_with(|| a.neighbor_term.total_cmp(&b.neighbor_term))
}

fn best_of(scored: Vec<Scored>, freq: &AreaFrequency) -> Option<Scored> {
    scored.into_iter().min_by(|a, b| score_order(a, b, freq))
}

fn empty_estimate(hood: &Neighborhood<'_>) -> Estimate {
    Estimate::new(
        AreaId::NONE,
        hood,
        0,
        Detail::Likelihood {
            score: 0.0,
            neighbor_term: 0.0,
            normalizer: 0.0,
        },
    )
}

/// Memoized `gamma` values for a single fit
#[derive(Debug, Default)]
struct GammaMemo {
    fit_id: u64,
    values: HashMap<AreaId, f64>,
}

/// Probability model with the normalization term precomputed per area.
///
/// Candidates are the distinct areas of the labeled neighbors.
pub struct ProbabilityModel {
    metric: Arc<dyn AreaMetric>,
    edge: EdgeProbability,
    gamma: GammaMemo,
}

impl ProbabilityModel {
    pub fn new(metric: Arc<dyn AreaMetric>, edge: EdgeProbability) -> Result<Self> {
        edge.validate()?;
        debug!("Probability model a={}, b={}, c={}", edge.a, edge.b, edge.c);
        Ok(Self {
            metric,
            edge,
            gamma: GammaMemo::default(),
        })
    }

    pub fn edge_probability(&self) -> &EdgeProbability {
        &self.edge
    }

    /// `gamma(area)` under `fit`, memoized
    pub fn gamma(&mut self, area: AreaId, fit: &FitResult) -> Result<f64> {
        if self.gamma.fit_id != fit.id() {
            self.gamma.values.clear();
            self.gamma.fit_id = fit.id();
        }
        if let Some(&value) = self.gamma.values.get(&area) {
            return Ok(value);
        }
        let mut value = 0.0;
        for (other, count) in fit.frequency().iter() {
            let (_, log_not_p) = self.edge.log_terms(self.metric.distance(area, other)?);
            value += count as f64 * log_not_p;
        }
        self.gamma.values.insert(area, value);
        Ok(value)
    }

    /// Number of memoized `gamma` values
    pub fn gamma_memo_len(&self) -> usize {
        self.gamma.values.len()
    }

    /// Full score of `area` given neighbor votes
    fn score(&mut self, area: AreaId, votes: &[(AreaId, u64)], fit: &FitResult) -> Result<Scored> {
        let mut neighbor_term = 0.0;
        for &(other, count) in votes {
            let (log_p, log_not_p) = self.edge.log_terms(self.metric.distance(area, other)?);
            neighbor_term += count as f64 * (log_p - log_not_p);
        }
        let normalizer = self.gamma(area, fit)?;
        Ok(Scored {
            area,
            score: neighbor_term + normalizer,
            neighbor_term,
            normalizer,
        })
    }
}

impl NeighborsBasedMethod for ProbabilityModel {
    fn name(&self) -> &'static str {
        "pm"
    }

    fn select(&mut self, hood: &Neighborhood<'_>, fit: &FitResult) -> Result<Estimate> {
        let mut votes = hood.votes();
        let labeled: usize = votes.iter().map(|&(_, n)| n as usize).sum();
        votes.sort_unstable_by_key(|&(area, _)| area);

        let mut scored = Vec::with_capacity(votes.len());
        for &(area, _) in &votes {
            scored.push(self.score(area, &votes, fit)?);
        }
        Ok(match best_of(scored, fit.frequency()) {
            Some(best) => best.estimate(hood, labeled),
            None => empty_estimate(hood),
        })
    }
}

/// Reference implementation that sums over every labeled training node.
///
/// Quadratic in the training size; for checking [`ProbabilityModel`].
pub struct NaiveProbabilityModel {
    metric: Arc<dyn AreaMetric>,
    edge: EdgeProbability,
}

impl NaiveProbabilityModel {
    pub fn new(metric: Arc<dyn AreaMetric>, edge: EdgeProbability) -> Result<Self> {
        edge.validate()?;
        Ok(Self { metric, edge })
    }

    /// `(score, neighbor term, normalizer)` of `area` for the query node.
    ///
    /// The score is the log-likelihood over every labeled training node: a
    /// neighbor reached by `m` parallel edges contributes `m ln p` and
    /// `-(m - 1) ln(1 - p)`, any other node contributes `ln(1 - p)`. The
    /// neighbor term and normalizer split the same sum the way
    /// [`ProbabilityModel`] does, per node instead of per area.
    pub fn likelihood(
        &self,
        area: AreaId,
        hood: &Neighborhood<'_>,
        fit: &FitResult,
    ) -> Result<(f64, f64, f64)> {
        let mut multiplicity: HashMap<NodeIdx, u64> = HashMap::new();
        for (&node, location) in hood.neighbors.iter().zip(hood.locations) {
            if location.is_some() {
                *multiplicity.entry(node).or_insert(0) += 1;
            }
        }

        let mut training: Vec<(NodeIdx, AreaId)> = fit.labeled().collect();
        training.sort_unstable();

        let mut edge_term = 0.0;
        let mut non_edge_term = 0.0;
        let mut neighbor_term = 0.0;
        let mut normalizer = 0.0;
        for (node, other) in training {
            let (log_p, log_not_p) = self.edge.log_terms(self.metric.distance(area, other)?);
            normalizer += log_not_p;
            match multiplicity.get(&node) {
                Some(&m) => {
                    edge_term += m as f64 * log_p;
                    non_edge_term -= (m - 1) as f64 * log_not_p;
                    neighbor_term += m as f64 * (log_p - log_not_p);
                }
                None => non_edge_term += log_not_p,
            }
        }
        Ok((edge_term + non_edge_term, neighbor_term, normalizer))
    }
}

impl NeighborsBasedMethod for NaiveProbabilityModel {
    fn name(&self) -> &'static str {
        "pm-naive"
    }

    fn select(&mut self, hood: &Neighborhood<'_>, fit: &FitResult) -> Result<Estimate> {
        let mut votes = hood.votes();
        let labeled: usize = votes.iter().map(|&(_, n)| n as usize).sum();
        votes.sort_unstable_by_key(|&(area, _)| area);

        let mut scored = Vec::with_capacity(votes.len());
        for &(area, _) in &votes {
            let (score, neighbor_term, normalizer) = self.likelihood(area, hood, fit)?;
            scored.push(Scored {
                area,
                score,
                neighbor_term,
                normalizer,
            });
        }
        Ok(match best_of(scored, fit.frequency()) {
            Some(best) => best.estimate(hood, labeled),
            None => empty_estimate(hood),
        })
    }
}
