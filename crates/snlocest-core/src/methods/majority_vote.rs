//! Majority vote over neighbor areas
//!
//! Davis Jr. et al., "Inferring the Location of Twitter Messages Based on
//! User Relationships", Transactions in GIS 15(6), 2011.

use std::cmp::Ordering;

use super::{Detail, Estimate, FitResult, MethodError, Neighborhood, NeighborsBasedMethod, Result};
use crate::areadata::AreaId;

/// Degree and vote thresholds below which no estimate is made.
///
/// The default accepts everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteFilter {
    /// Minimum out-degree
    pub min_friends: usize,
    /// Maximum out-degree
    pub max_friends: usize,
    /// Minimum votes for the winning area
    pub min_votes: u64,
}

impl Default for VoteFilter {
    fn default() -> Self {
        Self {
            min_friends: 0,
            max_friends: usize::MAX,
            min_votes: 0,
        }
    }
}

impl VoteFilter {
    pub fn validate(&self) -> Result<()> {
        if self.min_friends > self.max_friends {
            return Err(MethodError::InvalidParameter {
                name: "min_friends",
                reason: format!(
                    "{} is greater than max_friends {}",
                    self.min_friends, self.max_friends
                ),
            });
        }
        Ok(())
    }

    fn accepts_degree(&self, degree: usize) -> bool {
        (self.min_friends..=self.max_friends).contains(&degree)
    }
}

/// Picks the area with the most votes among labeled neighbors.
///
/// Ties go to the area seen more often in training, then the lower id.
#[derive(Debug, Clone, Default)]
pub struct MajorityVote {
    filter: VoteFilter,
}

impl MajorityVote {
    pub fn new(filter: VoteFilter) -> Result<Self> {
        filter.validate()?;
        Ok(Self { filter })
    }

    pub fn filter(&self) -> &VoteFilter {
        &self.filter
    }
}

impl NeighborsBasedMethod for MajorityVote {
    fn name(&self) -> &'static str {
        "mv"
    }

    fn select(&mut self, hood: &Neighborhood<'_>, fit: &FitResult) -> Result<Estimate> {
        let votes = hood.votes();
        let labeled: usize = votes.iter().map(|&(_, n)| n as usize).sum();

        if !self.filter.accepts_degree(hood.degree()) {
            return Ok(Estimate::new(AreaId::NONE, hood, labeled, Detail::Votes { count: 0 }));
        }

        let best = votes.iter().min_by(|a, b| vote_order(a, b, fit));

        let estimate = match best {
            Some(&(area, count)) if count >= self.filter.min_votes => {
                Estimate::new(area, hood, labeled, Detail::Votes { count })
            }
            Some(&(_, count)) => Estimate::new(AreaId::NONE, hood, labeled, Detail::Votes { count }),
            None => Estimate::new(AreaId::NONE, hood, 0, Detail::Votes { count: 0 }),
        };
        Ok(estimate)
    }
}

/// More votes first, then more frequent in training, then lower area id
fn vote_order(a: &(AreaId, u64), b: &(AreaId, u64), fit: &FitResult) -> Ordering {
    let freq = fit.frequency();
    b.1.cmp(&a.1)
        .then_with(|| freq.count(b.0).cmp(&freq.count(a.0)))
        .then_with(|| a.0.cmp(&b.0))
}
