//! [`Encryptor`]: the per-field encrypt/decrypt contract used by storage code.

use std::fmt;

use zeroize::Zeroizing;

use crate::{
    cipher,
    envelope::Envelope,
    kdf::{derive_key, DerivedKey},
    CryptoError,
};

/// Long-lived field encryptor holding only the derived key.
///
/// Immutable after construction and `Send + Sync`; share it behind an `Arc`
/// and call it from any number of tasks without locking. Each call builds
/// its own cipher state.
///
/// Empty strings pass through unchanged in both directions so optional
/// columns keep "empty means absent" semantics.
pub struct Encryptor {
    key: DerivedKey,
}

impl Encryptor {
    /// Derive the key from `secret` and build an encryptor.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the secret is shorter
    /// than [`crate::MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &str) -> Result<Self, CryptoError> {
        Ok(Self {
            key: derive_key(secret)?,
        })
    }

    /// Encrypt `plaintext` into its storable text envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Encryption`] if sealing fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Recover the plaintext from a stored envelope.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::InvalidFormat`] if `stored` is not base64.
    /// - [`CryptoError::InvalidCiphertext`] if it is shorter than a nonce.
    /// - [`CryptoError::DecryptionFailed`] if authentication fails.
    /// - [`CryptoError::NotUtf8`] if the authenticated bytes are not UTF-8.
    pub fn decrypt(&self, stored: &str) -> Result<String, CryptoError> {
        let plain = self.decrypt_bytes(stored)?;
        std::str::from_utf8(&plain)
            .map(str::to_owned)
            .map_err(|_| CryptoError::NotUtf8)
    }

    /// Byte-oriented variant of [`Encryptor::encrypt`].
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        Ok(cipher::seal(plaintext, &self.key)?.encode())
    }

    /// Byte-oriented variant of [`Encryptor::decrypt`]. The returned buffer
    /// is zeroised on drop.
    pub fn decrypt_bytes(&self, stored: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        if stored.is_empty() {
            return Ok(Zeroizing::new(Vec::new()));
        }
        let envelope = Envelope::decode(stored)?;
        cipher::open(&envelope, &self.key)
    }
}

impl fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encryptor").field("key", &self.key).finish()
    }
}
