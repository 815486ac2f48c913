//! AES-256-GCM field encryption for sensitive columns.
//!
//! Storage code holds one [`Encryptor`], built once at startup from the
//! operator secret, and calls [`Encryptor::encrypt`] before writing a
//! protected column and [`Encryptor::decrypt`] after reading it.
//!
//! This crate has no I/O, async, or logging dependencies.
//!
//! # Ciphertext format
//!
//! ```text
//! base64-std( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! An empty column value means "absent" and is never encrypted.

pub mod cipher;
pub mod encryptor;
pub mod envelope;
pub mod error;
pub mod kdf;

pub use encryptor::Encryptor;
pub use envelope::Envelope;
pub use error::CryptoError;
pub use kdf::{derive_key, DerivedKey};

/// Minimum secret length in bytes accepted by [`derive_key`].
pub const MIN_SECRET_LEN: usize = 32;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;
