//! Geodesic distance between areas
//!
//! [`AreaDistance`] looks up each area's representative point, applies a
//! [`DistanceFormula`] and memoizes the result in a bounded
//! [`DistanceCache`]. Inference methods only see the [`AreaMetric`] trait,
//! so tests can substitute a plain closure.

mod cache;
pub mod hubeny;
pub mod vincenty;

pub use cache::{AreaPair, CacheInfo, CacheMetrics, DistanceCache, DEFAULT_CACHE_CAPACITY};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::areadata::{AreaCoordinateData, AreaDataError, AreaId};

/// WGS-84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 semi-minor axis in meters
pub const WGS84_B: f64 = 6_356_752.314245;
/// WGS-84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257223563;

/// Errors from distance lookups
#[derive(Debug, Error)]
pub enum DistanceError {
    #[error("{0}")]
    AreaData(#[from] AreaDataError),

    #[error("unknown distance formula: {0}")]
    UnknownFormula(String),
}

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// How to turn two points into meters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceFormula {
    /// Ellipsoidal inverse solution
    #[default]
    Vincenty,
    /// Planar approximation, cheaper and fine at city scale
    Hubeny,
}

impl DistanceFormula {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceFormula::Vincenty => "vincenty",
            DistanceFormula::Hubeny => "hubeny",
        }
    }

    /// Distance in meters between two points
    pub fn distance(&self, p1: Point, p2: Point) -> f64 {
        match self {
            DistanceFormula::Vincenty => vincenty::inverse(p1, p2).unwrap_or_else(|| {
                warn!(
                    "Vincenty did not converge for {:?} -> {:?}, using great-circle distance",
                    p1, p2
                );
                vincenty::great_circle(p1, p2)
            }),
            DistanceFormula::Hubeny => hubeny::distance(p1, p2),
        }
    }
}

impl fmt::Display for DistanceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceFormula {
    type Err = DistanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vincenty" => Ok(DistanceFormula::Vincenty),
            "hubeny" => Ok(DistanceFormula::Hubeny),
            other => Err(DistanceError::UnknownFormula(other.to_string())),
        }
    }
}

/// Distance in meters between two areas.
pub trait AreaMetric: Send + Sync {
    fn distance(&self, a: AreaId, b: AreaId) -> Result<f64, DistanceError>;
}

impl<F> AreaMetric for F
where
    F: Fn(AreaId, AreaId) -> Result<f64, DistanceError> + Send + Sync,
{
    fn distance(&self, a: AreaId, b: AreaId) -> Result<f64, DistanceError> {
        self(a, b)
    }
}

/// Memoized area-to-area distance.
///
/// Keys are stored as `(min, max)`, so `distance(a, b)` and
/// `distance(b, a)` share one entry and return the same value.
#[derive(Debug)]
pub struct AreaDistance {
    areas: Arc<AreaCoordinateData>,
    formula: DistanceFormula,
    cache: DistanceCache,
}

impl AreaDistance {
    pub fn new(areas: Arc<AreaCoordinateData>, formula: DistanceFormula) -> Self {
        Self::with_capacity(areas, formula, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(
        areas: Arc<AreaCoordinateData>,
        formula: DistanceFormula,
        capacity: usize,
    ) -> Self {
        Self {
            areas,
            formula,
            cache: DistanceCache::new(capacity),
        }
    }

    pub fn formula(&self) -> DistanceFormula {
        self.formula
    }

    pub fn areas(&self) -> &Arc<AreaCoordinateData> {
        &self.areas
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.cache.cache_info()
    }

    pub fn clear_cache(&self) {
        self.cache.clear()
    }
}

impl AreaMetric for AreaDistance {
    fn distance(&self, a: AreaId, b: AreaId) -> Result<f64, DistanceError> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.cache.get_or_try_insert_with(key, || {
            let p1 = self.areas.get_point(key.0)?;
            let p2 = self.areas.get_point(key.1)?;
            Ok(self.formula.distance(p1, p2))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas() -> Arc<AreaCoordinateData> {
        let mut data = AreaCoordinateData::new();
        data.insert(AreaId(1), Point::new(139.767125, 35.681236), "Tokyo");
        data.insert(AreaId(2), Point::new(139.622314, 35.465798), "Yokohama");
        data.insert(AreaId(3), Point::new(135.495951, 34.702485), "Osaka");
        Arc::new(data)
    }

    #[test]
    fn test_formula_from_str() {
        assert_eq!("Vincenty".parse::<DistanceFormula>().unwrap(), DistanceFormula::Vincenty);
        assert_eq!("hubeny".parse::<DistanceFormula>().unwrap(), DistanceFormula::Hubeny);
        assert!("manhattan".parse::<DistanceFormula>().is_err());
    }

    #[test]
    fn test_distance_is_commutative() {
        let d = AreaDistance::new(areas(), DistanceFormula::Vincenty);
        for (a, b) in [(1, 2), (1, 3), (2, 3)] {
            let ab = d.distance(AreaId(a), AreaId(b)).unwrap();
            let ba = d.distance(AreaId(b), AreaId(a)).unwrap();
            assert!((ab - ba).abs() < 1e-6);
            assert!(ab > 0.0);
        }
    }

    #[test]
    fn test_repeated_calls_hit_cache() {
        let d = AreaDistance::new(areas(), DistanceFormula::Hubeny);
        let k = 5;
        for _ in 0..k {
            d.distance(AreaId(1), AreaId(3)).unwrap();
        }
        let info = d.cache_info();
        assert_eq!(info.misses, 1);
        assert_eq!(info.hits, k - 1);

        // Reversed order shares the entry
        d.distance(AreaId(3), AreaId(1)).unwrap();
        assert_eq!(d.cache_info().hits, k);

        d.clear_cache();
        assert_eq!(d.cache_info().len, 0);
    }

    #[test]
    fn test_same_area_is_zero() {
        let d = AreaDistance::new(areas(), DistanceFormula::Vincenty);
        assert_eq!(d.distance(AreaId(2), AreaId(2)).unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_area_propagates() {
        let d = AreaDistance::new(areas(), DistanceFormula::Vincenty);
        let err = d.distance(AreaId(1), AreaId(404)).unwrap_err();
        assert!(matches!(
            err,
            DistanceError::AreaData(AreaDataError::UnknownArea(AreaId(404)))
        ));
        // Failed lookups are not cached
        assert_eq!(d.cache_info().len, 0);
    }

    #[test]
    fn test_closure_metric() {
        let metric = |a: AreaId, b: AreaId| -> Result<f64, DistanceError> {
            Ok((a.0 as f64 - b.0 as f64).abs())
        };
        assert_eq!(AreaMetric::distance(&metric, AreaId(5), AreaId(2)).unwrap(), 3.0);
    }
}
