//! Derivation of the 256-bit field key from the operator secret.
//!
//! The secret is hashed once with SHA-256. This is not a password KDF: the
//! secret is expected to be a high-entropy configuration value, and the
//! length floor is only a coarse guard (32 repeated characters pass).

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, KEY_LEN, MIN_SECRET_LEN};

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// The bytes are overwritten with zeroes when the key is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material, even in debug builds.
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive the field key from `secret`.
///
/// The same secret always yields the same key, so values written by an
/// earlier process remain readable after a restart.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyLength`] if `secret` is shorter than
/// [`MIN_SECRET_LEN`] bytes.
pub fn derive_key(secret: &str) -> Result<DerivedKey, CryptoError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(CryptoError::InvalidKeyLength);
    }
    let mut digest: [u8; KEY_LEN] = Sha256::digest(secret.as_bytes()).into();
    let key = DerivedKey(digest);
    digest.zeroize();
    Ok(key)
}
