//! Cryptographic primitives for the TerraVault record store.
//!
//! This crate provides the two cryptographic concerns of the store:
//!
//! - **Payload sealing**: authenticated encryption of opaque sensitive blobs
//!   (raster imagery) under a process-scoped key, with a fresh random nonce
//!   per encryption and a fixed `[16-byte nonce][ciphertext]` layout
//! - **Content digests**: canonical BLAKE3 digests over a record's semantic
//!   fields, used for tamper detection on every trusted read
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - Nonces are generated inside the sealing call; callers cannot supply one
//! - The symmetric key never leaves the `CipherBox` and is overwritten when
//!   the box is dropped
//! - Digest verification is a predicate, never a side-effecting validator

pub mod cipher;
pub mod digest;
pub mod error;

pub use cipher::{CipherBox, NONCE_SIZE};
pub use digest::DigestWriter;
pub use error::{CryptoError, Result};
