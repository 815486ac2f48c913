//! Bank link storage: items (holding an aggregator access token) and the
//! accounts reachable through them (holding an aggregator account id).
//!
//! # Responsibilities
//!
//! - [`store`]: the persistence seam. Rows carry protected columns as
//!   envelopes and never see plaintext.
//! - [`service`]: encrypts protected columns before every write and decrypts
//!   them right after every read, using the injected [`fieldcrypt::Encryptor`].
//!
//! # Module invariants
//!
//! - A value that fails to decrypt is surfaced as [`LinkError::Crypto`]; it is
//!   never replaced by the stored envelope or an empty string.
//! - Alerts for crypto failures name the row and column, never the value.

pub mod model;
pub mod service;
pub mod store;

pub use model::{LinkAccount, LinkItem, NewLinkAccount, NewLinkItem};
pub use service::LinkService;
pub use store::{LinkStore, MemoryLinkStore, StoreError};

use common::ServiceError;
use fieldcrypt::CryptoError;
use thiserror::Error;

/// Errors produced by the link domain.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No row matched the lookup.
    #[error("{0} not found")]
    NotFound(String),

    /// Input rejected before touching the store.
    #[error("invalid input: {0}")]
    Invalid(&'static str),

    /// The store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A protected column could not be encrypted or decrypted.
    #[error("protected column failed: {0}")]
    Crypto(#[from] CryptoError),
}

impl From<LinkError> for ServiceError {
    fn from(e: LinkError) -> Self {
        match e {
            LinkError::NotFound(what) => ServiceError::NotFound(format!("{what} not found")),
            LinkError::Invalid(msg) => ServiceError::BadRequest(msg.into()),
            LinkError::Store(StoreError::Duplicate(what)) => {
                ServiceError::Conflict(format!("{what} already exists"))
            }
            LinkError::Store(StoreError::UnknownItem(id)) => {
                ServiceError::NotFound(format!("link item {id} not found"))
            }
            LinkError::Store(e @ StoreError::Backend(_)) => ServiceError::Internal(e.to_string()),
            LinkError::Crypto(c) => ServiceError::EncryptionFailure(c.to_string()),
        }
    }
}
