//! Geodesic calculations for the TerraVault record store.
//!
//! This crate provides the pure geometry layer used by the store: validated
//! coordinates, great-circle distance and bearing via the Haversine formula,
//! a closed set of distance units with per-unit Earth radii, and path
//! aggregation over ordered coordinate sequences.
//!
//! All functions are pure and deterministic: identical inputs produce
//! bit-identical outputs. Coordinate validation happens at construction,
//! so every `Coordinate` handed to a calculation is already in range.

pub mod coordinate;
pub mod error;
pub mod geodesic;
pub mod path;
pub mod unit;

pub use coordinate::Coordinate;
pub use error::{GeoError, Result};
pub use geodesic::{bearing, distance, distance_km};
pub use path::{segment_distances, total_distance};
pub use unit::DistanceUnit;
