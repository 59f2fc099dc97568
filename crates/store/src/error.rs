//! Store error types.
//!
//! Validation and reference errors are caller mistakes and surface before
//! any row is touched. `Integrity` marks stored content that no longer
//! matches its digest or fails to decrypt. `Storage` is fatal to the
//! in-progress operation but not to the process.

use terravault_crypto::CryptoError;
use terravault_geo::GeoError;
use thiserror::Error;

/// Errors that can occur in record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate map name: {0}")]
    DuplicateName(String),

    #[error("Unknown map: id={0}")]
    UnknownMap(i64),

    #[error("Unknown point: id={0}")]
    UnknownPoint(i64),

    #[error("Unknown path: id={0}")]
    UnknownPath(i64),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<GeoError> for StoreError {
    fn from(err: GeoError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

impl From<CryptoError> for StoreError {
    fn from(err: CryptoError) -> Self {
        StoreError::Integrity(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
