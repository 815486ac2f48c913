//! Failure kinds surfaced by the field encryption layer.
//!
//! Messages are static text. No variant carries the secret, the key, the
//! plaintext, or the offending envelope, so every error is safe to log.

use thiserror::Error;

use crate::MIN_SECRET_LEN;

/// Errors produced by key derivation, the cipher, and the envelope codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The secret is too short to derive a key from. Raised at construction
    /// time; callers must treat it as a fatal configuration error.
    #[error("encryption secret must be at least {MIN_SECRET_LEN} bytes")]
    InvalidKeyLength,

    /// The stored value is not valid base64.
    #[error("stored value is not a valid envelope encoding")]
    InvalidFormat,

    /// The decoded envelope is shorter than a nonce.
    #[error("invalid ciphertext")]
    InvalidCiphertext,

    /// AEAD authentication failed. Wrong key and tampered data are reported
    /// identically.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Nonce generation or sealing failed.
    #[error("encryption failed")]
    Encryption,

    /// The authenticated plaintext is not UTF-8 and cannot be returned as a string.
    #[error("decrypted value is not valid UTF-8")]
    NotUtf8,
}
