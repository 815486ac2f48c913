//! Storage form of one encrypted field.
//!
//! ```text
//! base64-std( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! Standard base64 with padding: the alphabet needs no escaping inside a
//! text column or a JSON string, and encoding depends only on the bytes.

use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{CryptoError, NONCE_LEN};

/// A parsed encrypted field value: the nonce and the sealed bytes
/// (ciphertext followed by the authentication tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    nonce: [u8; NONCE_LEN],
    sealed: Vec<u8>,
}

impl Envelope {
    pub(crate) fn new(nonce: [u8; NONCE_LEN], sealed: Vec<u8>) -> Self {
        Self { nonce, sealed }
    }

    /// Nonce prefix.
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext + tag.
    pub fn sealed(&self) -> &[u8] {
        &self.sealed
    }

    /// Raw `nonce || sealed` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.sealed.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.sealed);
        out
    }

    /// Split raw envelope bytes into nonce and sealed parts.
    ///
    /// Only the nonce length is checked here; a too-short sealed part is
    /// rejected later by tag verification.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidCiphertext`] if `bytes` is shorter than
    /// [`NONCE_LEN`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < NONCE_LEN {
            return Err(CryptoError::InvalidCiphertext);
        }
        let (nonce_bytes, sealed) = bytes.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);
        Ok(Self {
            nonce,
            sealed: sealed.to_vec(),
        })
    }

    /// Encode to the canonical text representation.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Parse the text representation.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidFormat`] if `s` is not valid base64, or
    /// [`CryptoError::InvalidCiphertext`] if it decodes to fewer than
    /// [`NONCE_LEN`] bytes.
    pub fn decode(s: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD.decode(s).map_err(|_| CryptoError::InvalidFormat)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Envelope {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
