//! Payload sealing with AES-256-GCM.
//!
//! Sensitive blobs are stored as `[16-byte nonce][ciphertext+tag]`. The
//! layout is fixed: future readers of stored payloads depend on it.
//!
//! # Key Lifecycle
//!
//! The symmetric key is generated from the OS RNG when the box is created,
//! lives only in memory, and is overwritten when the box is dropped. There
//! is no accessor for it and no constructor that accepts one, so two boxes
//! can never alias the same key material.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

/// Nonce size in bytes, fixed by the sealed-payload layout.
pub const NONCE_SIZE: usize = 16;

/// AES-256-GCM parameterized with the 128-bit nonce the layout requires.
type PayloadCipher = AesGcm<Aes256, U16>;

/// Authenticated encryption for sensitive payload fields.
pub struct CipherBox {
    /// The only persistent copy of the key; overwritten on drop.
    key: Zeroizing<[u8; 32]>,
}

impl CipherBox {
    /// Create a box with a fresh random 256-bit key.
    pub fn new() -> Self {
        let mut key = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(key.as_mut());
        Self { key }
    }

    /// Encrypt a payload under this box's key.
    ///
    /// A fresh random 16-byte nonce is generated on every call and prepended
    /// to the ciphertext.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - `nonce ‖ ciphertext`
    /// * `Err(CryptoError)` - Encryption failure
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let cipher = self.cipher();
        let nonce = Nonce::<U16>::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt a sealed payload.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - The original plaintext
    /// * `Err(CryptoError::IntegrityViolation)` - Truncated payload or
    ///   authentication failure
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_SIZE {
            return Err(CryptoError::IntegrityViolation(format!(
                "Sealed payload shorter than nonce: {} bytes",
                sealed.len()
            )));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let cipher = self.cipher();
        let nonce = Nonce::<U16>::from_slice(nonce_bytes);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::IntegrityViolation("Authentication failed".to_string()))
    }

    /// Round keys are expanded per call; only the zeroizing buffer persists.
    fn cipher(&self) -> PayloadCipher {
        PayloadCipher::new(Key::<PayloadCipher>::from_slice(self.key.as_ref()))
    }
}

impl Default for CipherBox {
    fn default() -> Self {
        Self::new()
    }
}
