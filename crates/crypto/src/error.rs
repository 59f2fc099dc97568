//! Crypto error types.
//!
//! `Encryption` marks a failure to seal a payload. `IntegrityViolation`
//! marks a sealed payload that is truncated, malformed, or fails
//! authentication on open.

use thiserror::Error;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
