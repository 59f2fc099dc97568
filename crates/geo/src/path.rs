//! Path aggregation over ordered coordinate sequences.

use crate::coordinate::Coordinate;
use crate::geodesic::distance;
use crate::unit::DistanceUnit;

/// Distance of each consecutive segment along the path.
///
/// Returns `max(0, len - 1)` values.
pub fn segment_distances(points: &[Coordinate], unit: DistanceUnit) -> Vec<f64> {
    points
        .windows(2)
        .map(|pair| distance(pair[0], pair[1], unit))
        .collect()
}

/// Total distance along the path; `0.0` for zero or one points.
pub fn total_distance(points: &[Coordinate], unit: DistanceUnit) -> f64 {
    segment_distances(points, unit).iter().sum()
}
