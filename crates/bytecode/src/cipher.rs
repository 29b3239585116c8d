//! Per-title scenario cipher.
//!
//! Each title ships scenarios XOR-masked with a short repeating key over a
//! fixed window of the scenario blob. Titles without a registered key use the
//! identity transform, which is also what test archives are built with.
//!
//! The transform is an involution: [`CipherKey::encrypt`] and
//! [`CipherKey::decrypt`] are the same operation.

use serde::{Deserialize, Serialize};

/// Key material and the window it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CipherKey {
    bytes: Vec<u8>,
    offset: usize,
    span: Option<usize>,
}

impl CipherKey {
    /// The "no cipher" key.
    pub fn identity() -> Self {
        Self::default()
    }

    /// A key applied from `offset` to the end of the buffer.
    pub fn new(bytes: impl Into<Vec<u8>>, offset: usize) -> Self {
        Self {
            bytes: bytes.into(),
            offset,
            span: None,
        }
    }

    /// A key applied to `span` bytes starting at `offset`.
    pub fn windowed(bytes: impl Into<Vec<u8>>, offset: usize, span: usize) -> Self {
        Self {
            bytes: bytes.into(),
            offset,
            span: Some(span),
        }
    }

    /// Whether this key leaves every buffer unchanged.
    pub fn is_identity(&self) -> bool {
        self.bytes.is_empty() || self.span == Some(0)
    }

    /// Key bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// First masked byte position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of masked bytes, `None` for "to the end".
    pub fn span(&self) -> Option<usize> {
        self.span
    }

    /// Decipher `data` in place.
    pub fn decrypt_in_place(&self, data: &mut [u8]) {
        if self.is_identity() || self.offset >= data.len() {
            return;
        }
        let end = match self.span {
            Some(span) => self.offset.saturating_add(span).min(data.len()),
            None => data.len(),
        };
        for (i, byte) in data[self.offset..end].iter_mut().enumerate() {
            *byte ^= self.bytes[i % self.bytes.len()];
        }
    }

    /// Encipher `data` in place.
    pub fn encrypt_in_place(&self, data: &mut [u8]) {
        self.decrypt_in_place(data);
    }

    /// Decipher a copy of `data`.
    pub fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.decrypt_in_place(&mut out);
        out
    }

    /// Encipher a copy of `data`.
    pub fn encrypt(&self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.encrypt_in_place(&mut out);
        out
    }
}
