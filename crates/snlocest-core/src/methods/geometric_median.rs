//! Geometric median of neighbor areas
//!
//! Jurgens, "That's What Friends Are For", ICWSM 2013, eq. (1).

use std::sync::Arc;

use super::{Detail, Estimate, FitResult, Neighborhood, NeighborsBasedMethod, Result};
use crate::areadata::AreaId;
use crate::distance::AreaMetric;

/// Picks the neighbor area minimizing the vote-weighted distance sum.
pub struct GeometricMedian {
    metric: Arc<dyn AreaMetric>,
}

impl GeometricMedian {
    pub fn new(metric: Arc<dyn AreaMetric>) -> Self {
        Self { metric }
    }
}

impl NeighborsBasedMethod for GeometricMedian {
    fn name(&self) -> &'static str {
        "gm"
    }

    fn select(&mut self, hood: &Neighborhood<'_>, fit: &FitResult) -> Result<Estimate> {
        let mut candidates = hood.votes();
        let labeled: usize = candidates.iter().map(|&(_, n)| n as usize).sum();
        if candidates.is_empty() {
            return Ok(Estimate::new(AreaId::NONE, hood, 0, Detail::None));
        }

        // Stable: equally frequent areas keep first-seen order
        let freq = fit.frequency();
        candidates.sort_by(|a, b| freq.count(b.0).cmp(&freq.count(a.0)));

        let mut best_sum = f64::INFINITY;
        let mut median = AreaId::NONE;
        for &(a1, _) in &candidates {
            let mut sum = 0.0;
            for &(a2, votes) in &candidates {
                sum += self.metric.distance(a1, a2)? * votes as f64;
                if best_sum < sum {
                    break;
                }
            }
            if best_sum > sum {
                best_sum = sum;
                median = a1;
            }
        }
        Ok(Estimate::new(median, hood, labeled, Detail::None))
    }
}
