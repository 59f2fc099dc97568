//! Great-circle distance and bearing via the Haversine formula.
//!
//! Distances are computed directly in the requested unit using that unit's
//! Earth-radius constant. Identical coordinate pairs short-circuit to an
//! exact `0.0`: floating-point Haversine on equal inputs can yield small
//! spurious non-zero values.

use crate::coordinate::Coordinate;
use crate::unit::DistanceUnit;

/// Calculate the great-circle distance between two points.
///
/// Haversine: `a = sin²(Δφ/2) + cos φ1 · cos φ2 · sin²(Δλ/2)`,
/// `c = 2 · atan2(√a, √(1−a))`, result `= R(unit) · c`.
///
/// # Arguments
/// * `a` - First point
/// * `b` - Second point
/// * `unit` - Unit for the result
///
/// # Returns
/// * Distance in the requested unit; exactly `0.0` for identical points
pub fn distance(a: Coordinate, b: Coordinate, unit: DistanceUnit) -> f64 {
    if a.latitude == b.latitude && a.longitude == b.longitude {
        return 0.0;
    }

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    unit.earth_radius() * c
}

/// Great-circle distance in kilometers.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    distance(a, b, DistanceUnit::Kilometers)
}

/// Calculate the initial bearing from `a` to `b`.
///
/// # Returns
/// * Initial bearing in degrees, normalized to `[0, 360)`
pub fn bearing(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_identical_points_exact_zero() {
        let p = coord(51.5074, -0.1278);
        assert_eq!(distance(p, p, DistanceUnit::Kilometers), 0.0);
        assert_eq!(distance(p, p, DistanceUnit::Feet), 0.0);
    }

    #[test]
    fn test_distance_symmetry() {
        let a = coord(40.7128, -74.0060);
        let b = coord(34.0522, -118.2437);
        assert_eq!(distance_km(a, b), distance_km(b, a));
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        // One degree of longitude at the equator is about 111.19 km
        let a = coord(0.0, 0.0);
        let b = coord(0.0, 1.0);
        let d = distance_km(a, b);
        assert!((d - 111.19).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_bearing_due_east_at_equator() {
        let a = coord(0.0, 0.0);
        let b = coord(0.0, 1.0);
        let brg = bearing(a, b);
        assert!((brg - 90.0).abs() < 1e-9, "got {}", brg);
    }

    #[test]
    fn test_bearing_due_north() {
        let a = coord(0.0, 0.0);
        let b = coord(1.0, 0.0);
        let brg = bearing(a, b);
        assert!(brg.abs() < 1e-9, "got {}", brg);
    }

    #[test]
    fn test_bearing_normalized_range() {
        let a = coord(10.0, 10.0);
        for (lat, lon) in [(5.0, 5.0), (15.0, 5.0), (5.0, 15.0), (-10.0, -20.0)] {
            let brg = bearing(a, coord(lat, lon));
            assert!((0.0..360.0).contains(&brg), "bearing {} out of range", brg);
        }
    }

    #[test]
    fn test_triangle_inequality() {
        let a = coord(10.0, 20.0);
        let b = coord(30.0, 40.0);
        let c = coord(15.0, 50.0);
        let direct = distance_km(a, b);
        let via = distance_km(a, c) + distance_km(c, b);
        assert!(direct <= via + 1e-9);
    }

    #[test]
    fn test_units_agree_on_same_arc() {
        let a = coord(0.0, 0.0);
        let b = coord(0.0, 90.0);
        let km = distance(a, b, DistanceUnit::Kilometers);
        let m = distance(a, b, DistanceUnit::Meters);
        // Same arc, radii differ by a factor of 1000
        assert!((m / km - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_determinism() {
        let a = coord(48.8566, 2.3522);
        let b = coord(35.6762, 139.6503);
        let first = distance(a, b, DistanceUnit::NauticalMiles);
        for _ in 0..10 {
            assert_eq!(distance(a, b, DistanceUnit::NauticalMiles), first);
        }
    }
}
