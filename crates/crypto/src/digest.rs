//! Canonical content digests for tamper detection.
//!
//! A digest is a BLAKE3 hash over an ordered concatenation of a record's
//! semantic fields, rendered as lowercase hex. The writing rules make the
//! digest reproducible across implementations:
//!
//! - Fields are written in the fixed order documented on each record type
//! - Absent (`None`) fields are skipped; no sentinel bytes are written
//! - Text is written as UTF-8, binary fields as raw bytes
//! - Floats are written as shortest round-trip decimal text

use blake3::Hasher;

/// Field-by-field writer producing a hex content digest.
pub struct DigestWriter {
    hasher: Hasher,
}

impl DigestWriter {
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
        }
    }

    /// Write a text field.
    pub fn text(&mut self, value: &str) {
        self.hasher.update(value.as_bytes());
    }

    /// Write an optional text field; `None` is skipped.
    pub fn opt_text(&mut self, value: Option<&str>) {
        if let Some(value) = value {
            self.text(value);
        }
    }

    /// Write a binary field.
    pub fn bytes(&mut self, value: &[u8]) {
        self.hasher.update(value);
    }

    /// Write an optional binary field; `None` is skipped.
    pub fn opt_bytes(&mut self, value: Option<&[u8]>) {
        if let Some(value) = value {
            self.bytes(value);
        }
    }

    /// Write a float as decimal text.
    pub fn decimal(&mut self, value: f64) {
        self.hasher.update(value.to_string().as_bytes());
    }

    /// Finalize into a 64-character lowercase hex digest.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize().as_bytes())
    }
}

impl Default for DigestWriter {
    fn default() -> Self {
        Self::new()
    }
}
