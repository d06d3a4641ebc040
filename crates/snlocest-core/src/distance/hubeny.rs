//! Hubeny's planar approximation on the WGS-84 ellipsoid

use super::{Point, WGS84_A, WGS84_B};

/// First eccentricity squared
const E2: f64 = (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_A * WGS84_A);

/// Numerator of the meridian radius of curvature, `a(1 - e^2)`
const M_NUMERATOR: f64 = WGS84_A * (1.0 - E2);

/// Distance in meters. Accurate for points up to a few hundred kilometers
/// apart.
pub fn distance(p1: Point, p2: Point) -> f64 {
    let dx = (p1.lon - p2.lon).to_radians();
    let dy = (p1.lat - p2.lat).to_radians();
    let mu = ((p1.lat + p2.lat) / 2.0).to_radians();
    let sin_mu = mu.sin();
    let w = (1.0 - E2 * sin_mu * sin_mu).sqrt();
    let m = M_NUMERATOR / (w * w * w);
    let n = WGS84_A / w;
    ((dy * m).powi(2) + (dx * n * mu.cos()).powi(2)).sqrt()
}
