//! Distance units with per-unit Earth radii and conversion factors.
//!
//! The unit set is a closed enumeration: adding a unit is a compile-time
//! checked change, not a string-table edit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth's radius in different units
const EARTH_RADIUS_MILES: f64 = 3958.756;
const EARTH_RADIUS_NAUTICAL_MILES: f64 = 3440.065;
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
const EARTH_RADIUS_FEET: f64 = 20_902_231.0;

/// Supported distance units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    Kilometers,
    Meters,
    Miles,
    NauticalMiles,
    Feet,
}

impl DistanceUnit {
    /// Earth radius expressed in this unit.
    ///
    /// Each radius is an independent constant so a Haversine result in any
    /// unit is computed directly, not by converting a kilometer result.
    pub fn earth_radius(&self) -> f64 {
        match self {
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
            DistanceUnit::Meters => EARTH_RADIUS_METERS,
            DistanceUnit::Miles => EARTH_RADIUS_MILES,
            DistanceUnit::NauticalMiles => EARTH_RADIUS_NAUTICAL_MILES,
            DistanceUnit::Feet => EARTH_RADIUS_FEET,
        }
    }

    /// Multiplier taking a value in this unit to kilometers.
    pub fn to_km_factor(&self) -> f64 {
        match self {
            DistanceUnit::Kilometers => 1.0,
            DistanceUnit::Meters => 0.001,
            DistanceUnit::Miles => 1.60934,
            DistanceUnit::NauticalMiles => 1.852,
            DistanceUnit::Feet => 0.0003048,
        }
    }

    /// Convert an already-computed distance value between units.
    ///
    /// Goes through kilometers; intended for retargeting stored distances,
    /// not for fresh calculations (those use the per-unit Earth radius).
    pub fn convert(value: f64, from: DistanceUnit, to: DistanceUnit) -> f64 {
        value * from.to_km_factor() / to.to_km_factor()
    }

    /// Short unit label used in stored columns and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Meters => "m",
            DistanceUnit::Miles => "mi",
            DistanceUnit::NauticalMiles => "nm",
            DistanceUnit::Feet => "ft",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceUnit {
    type Err = GeoError;

    /// Parse a unit label, case-insensitive. Accepts both short and long
    /// forms: `km`/`kilometers`, `m`/`meters`, `mi`/`miles`,
    /// `nm`/`nautical miles`, `ft`/`feet`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "km" | "kilometers" => Ok(DistanceUnit::Kilometers),
            "m" | "meters" => Ok(DistanceUnit::Meters),
            "mi" | "miles" => Ok(DistanceUnit::Miles),
            "nm" | "nautical miles" => Ok(DistanceUnit::NauticalMiles),
            "ft" | "feet" => Ok(DistanceUnit::Feet),
            other => Err(GeoError::UnknownUnit(other.to_string())),
        }
    }
}
