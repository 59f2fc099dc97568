//! Geometry error types

use thiserror::Error;

/// Errors raised by coordinate validation and unit parsing.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Unknown distance unit: {0}")]
    UnknownUnit(String),
}

pub type Result<T> = std::result::Result<T, GeoError>;
