//! Validated geographic coordinates.

use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// A geographic coordinate in decimal degrees.
///
/// Construction validates the ranges, so any `Coordinate` value held by a
/// caller is known to be in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new geographic coordinate.
    ///
    /// # Arguments
    /// * `latitude` - Latitude in degrees (-90 to 90)
    /// * `longitude` - Longitude in degrees (-180 to 180)
    ///
    /// # Returns
    /// * `Ok(Coordinate)` - Valid coordinate
    /// * `Err(GeoError)` - Out-of-range latitude or longitude
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidCoordinate(format!(
                "Latitude must be between -90 and 90, got {}",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidCoordinate(format!(
                "Longitude must be between -180 and 180, got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let coord = Coordinate::new(45.5, -122.6).unwrap();
        assert_eq!(coord.latitude, 45.5);
        assert_eq!(coord.longitude, -122.6);
    }

    #[test]
    fn test_boundary_coordinates() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_latitude_out_of_range() {
        let result = Coordinate::new(90.1, 0.0);
        assert!(matches!(result, Err(GeoError::InvalidCoordinate(_))));
    }

    #[test]
    fn test_longitude_out_of_range() {
        let result = Coordinate::new(0.0, -180.5);
        assert!(matches!(result, Err(GeoError::InvalidCoordinate(_))));
    }
}
