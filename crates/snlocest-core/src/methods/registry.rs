//! Method registry: names, parameters and construction

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    EdgeProbability, GeometricMedian, MajorityVote, MethodError, NearestNeighbor,
    NeighborsBasedMethod, ProbabilityModel, RandomNeighbor, Result, VoteFilter,
};
use crate::distance::AreaMetric;

/// Inference methods offered on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodKind {
    MajorityVote,
    GeometricMedian,
    RandomNeighbor,
    NearestNeighbor,
    ProbabilityModel,
}

impl MethodKind {
    pub const ALL: [MethodKind; 5] = [
        MethodKind::MajorityVote,
        MethodKind::GeometricMedian,
        MethodKind::RandomNeighbor,
        MethodKind::NearestNeighbor,
        MethodKind::ProbabilityModel,
    ];

    /// Short name
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::MajorityVote => "mv",
            MethodKind::GeometricMedian => "gm",
            MethodKind::RandomNeighbor => "rn",
            MethodKind::NearestNeighbor => "nn",
            MethodKind::ProbabilityModel => "pm",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            MethodKind::MajorityVote => "majority-vote",
            MethodKind::GeometricMedian => "geometric-median",
            MethodKind::RandomNeighbor => "random-neighbor",
            MethodKind::NearestNeighbor => "nearest-neighbor",
            MethodKind::ProbabilityModel => "probability-model",
        }
    }

    /// Whether building the method requires an [`AreaMetric`]
    pub fn needs_metric(&self) -> bool {
        matches!(
            self,
            MethodKind::GeometricMedian | MethodKind::NearestNeighbor | MethodKind::ProbabilityModel
        )
    }

    /// Whether prediction reads the query node's own training label.
    ///
    /// Such methods only ever see that label under single-fit leave-one-out.
    pub fn reads_own_label(&self) -> bool {
        matches!(self, MethodKind::NearestNeighbor)
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodKind {
    type Err = MethodError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_ascii_lowercase().replace('_', "-");
        MethodKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted || k.long_name() == wanted)
            .ok_or_else(|| MethodError::UnknownMethod(s.to_string()))
    }
}

/// Tunable parameters shared by all methods; each method reads its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodParams {
    /// Seed for [`RandomNeighbor`]
    pub random_state: u64,
    /// Thresholds for [`MajorityVote`]
    pub vote_filter: VoteFilter,
    /// Curve for [`ProbabilityModel`]
    pub edge_probability: EdgeProbability,
}

impl Default for MethodParams {
    fn default() -> Self {
        Self {
            random_state: super::random_neighbor::DEFAULT_RANDOM_STATE,
            vote_filter: VoteFilter::default(),
            edge_probability: EdgeProbability::default(),
        }
    }
}

/// A method kind with its parameters, buildable any number of times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodSpec {
    pub kind: MethodKind,
    pub params: MethodParams,
}

impl MethodSpec {
    pub fn new(kind: MethodKind) -> Self {
        Self {
            kind,
            params: MethodParams::default(),
        }
    }

    pub fn with_params(mut self, params: MethodParams) -> Self {
        self.params = params;
        self
    }

    /// Build a fresh method instance.
    ///
    /// Fails when the method needs a metric and none is given, or when the
    /// parameters are invalid.
    pub fn build(
        &self,
        metric: Option<Arc<dyn AreaMetric>>,
    ) -> Result<Box<dyn NeighborsBasedMethod>> {
        let need_metric = || metric.clone().ok_or(MethodError::MissingMetric(self.kind.as_str()));
        let method: Box<dyn NeighborsBasedMethod> = match self.kind {
            MethodKind::MajorityVote => Box::new(MajorityVote::new(self.params.vote_filter)?),
            MethodKind::RandomNeighbor => Box::new(RandomNeighbor::new(self.params.random_state)),
            MethodKind::GeometricMedian => Box::new(GeometricMedian::new(need_metric()?)),
            MethodKind::NearestNeighbor => Box::new(NearestNeighbor::new(need_metric()?)),
            MethodKind::ProbabilityModel => Box::new(ProbabilityModel::new(
                need_metric()?,
                self.params.edge_probability,
            )?),
        };
        Ok(method)
    }
}
