//! AES-256-GCM sealing and opening of individual field values.
//!
//! A fresh 96-bit nonce is drawn from the OS CSPRNG for every seal. GCM
//! nonce reuse under one key breaks both confidentiality and authentication,
//! so nonces are never derived from a counter or from the plaintext.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use zeroize::Zeroizing;

use crate::{envelope::Envelope, kdf::DerivedKey, CryptoError, NONCE_LEN};

/// Seal `plaintext` under `key` with a random nonce and no associated data.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the CSPRNG or the AEAD fails
/// (unreachable with a healthy OS RNG and a valid key).
pub fn seal(plaintext: &[u8], key: &DerivedKey) -> Result<Envelope, CryptoError> {
    let cipher = build_cipher(key);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|_| CryptoError::Encryption)?;

    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    Ok(Envelope::new(nonce_bytes, sealed))
}

/// Verify and open `envelope` under `key`.
///
/// Nothing is returned unless the tag verifies; the plaintext buffer is
/// zeroised when dropped.
///
/// # Errors
///
/// Returns [`CryptoError::DecryptionFailed`] on any authentication failure:
/// wrong key, altered nonce, altered ciphertext or tag, or a truncated seal.
pub fn open(envelope: &Envelope, key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher = build_cipher(key);
    cipher
        .decrypt(Nonce::from_slice(envelope.nonce()), envelope.sealed())
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::DecryptionFailed)
}

fn build_cipher(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{kdf::derive_key, TAG_LEN};

    fn key() -> DerivedKey {
        derive_key("12345678901234567890123456789012").unwrap()
    }

    #[test]
    fn seal_open_round_trip() {
        let key = key();
        let env = seal(b"access-sandbox-1234", &key).unwrap();
        let plain = open(&env, &key).unwrap();
        assert_eq!(plain.as_slice(), b"access-sandbox-1234");
    }

    #[test]
    fn sealed_length_is_plaintext_plus_tag() {
        let env = seal(b"hello", &key()).unwrap();
        assert_eq!(env.sealed().len(), 5 + TAG_LEN);
    }

    #[test]
    fn fresh_nonce_per_seal() {
        let key = key();
        let a = seal(b"same", &key).unwrap();
        let b = seal(b"same", &key).unwrap();
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.sealed(), b.sealed());
    }

    #[test]
    fn wrong_key_fails() {
        let env = seal(b"secret", &key()).unwrap();
        let other = derive_key("abcdefghijklmnopqrstuvwxyz0123456789").unwrap();
        assert_eq!(open(&env, &other).unwrap_err(), CryptoError::DecryptionFailed);
    }

    #[test]
    fn tampered_ciphertext_fails_auth() {
        let key = key();
        let env = seal(b"tamper me", &key).unwrap();
        let mut raw = env.to_bytes();
        raw[NONCE_LEN] ^= 0xFF;
        let tampered = Envelope::from_bytes(&raw).unwrap();
        assert_eq!(open(&tampered, &key).unwrap_err(), CryptoError::DecryptionFailed);
    }

    #[test]
    fn tampered_nonce_fails_auth() {
        let key = key();
        let env = seal(b"tamper me", &key).unwrap();
        let mut raw = env.to_bytes();
        raw[0] ^= 0x01;
        let tampered = Envelope::from_bytes(&raw).unwrap();
        assert_eq!(open(&tampered, &key).unwrap_err(), CryptoError::DecryptionFailed);
    }

    #[test]
    fn truncated_seal_fails_auth() {
        let key = key();
        let env = seal(b"truncate me", &key).unwrap();
        let mut raw = env.to_bytes();
        raw.truncate(NONCE_LEN + 4);
        let short = Envelope::from_bytes(&raw).unwrap();
        assert_eq!(open(&short, &key).unwrap_err(), CryptoError::DecryptionFailed);
    }

    #[test]
    fn interoperates_with_plain_aes_gcm() {
        // Rows written by any AES-256-GCM producer keyed with SHA-256(secret)
        // and laid out as nonce || ct || tag must open.
        use sha2::{Digest, Sha256};
        let secret = "12345678901234567890123456789012";
        let raw_key = Sha256::digest(secret.as_bytes());
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&raw_key));
        let nonce = [3u8; NONCE_LEN];
        let ct = cipher
            .encrypt(Nonce::from_slice(&nonce), b"legacy-row".as_ref())
            .unwrap();
        let mut raw = nonce.to_vec();
        raw.extend_from_slice(&ct);

        let env = Envelope::from_bytes(&raw).unwrap();
        let plain = open(&env, &derive_key(secret).unwrap()).unwrap();
        assert_eq!(plain.as_slice(), b"legacy-row");
    }
}
