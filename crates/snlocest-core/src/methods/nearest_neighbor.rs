//! Nearest labeled neighbor
//!
//! An oracle baseline: it reads the query node's own training label and
//! returns the neighbor area closest to it.

use std::sync::Arc;

use super::{Detail, Estimate, FitResult, Neighborhood, NeighborsBasedMethod, Result};
use crate::areadata::AreaId;
use crate::distance::AreaMetric;

pub struct NearestNeighbor {
    metric: Arc<dyn AreaMetric>,
}

impl NearestNeighbor {
    pub fn new(metric: Arc<dyn AreaMetric>) -> Self {
        Self { metric }
    }
}

impl NeighborsBasedMethod for NearestNeighbor {
    fn name(&self) -> &'static str {
        "nn"
    }

    fn select(&mut self, hood: &Neighborhood<'_>, fit: &FitResult) -> Result<Estimate> {
        let areas = hood.labeled_areas();
        let unknown = |labeled| {
            Estimate::new(AreaId::NONE, hood, labeled, Detail::Distance { meters: None })
        };

        let Some(own) = fit.label(hood.node) else {
            return Ok(unknown(areas.len()));
        };
        if areas.is_empty() {
            return Ok(unknown(0));
        }

        let mut nearest = (AreaId::NONE, f64::INFINITY);
        for &area in &areas {
            let d = self.metric.distance(own, area)?;
            if d < nearest.1 {
                nearest = (area, d);
            }
        }
        // Every distance was NaN
        if nearest.0.is_none() {
            return Ok(unknown(areas.len()));
        }
        Ok(Estimate::new(
            nearest.0,
            hood,
            areas.len(),
            Detail::Distance {
                meters: Some(nearest.1),
            },
        ))
    }
}
