//! Shared application state injected into every Axum handler.

use crate::link::LinkService;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-backed) so that Axum can clone the
/// state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// Link storage with transparent field encryption.
    pub links: LinkService,
}

impl AppState {
    /// Create a new [`AppState`] around a composed [`LinkService`].
    pub fn new(links: LinkService) -> Self {
        Self { links }
    }
}

#[cfg(test)]
impl AppState {
    /// State over an empty in-memory store, suitable for tests.
    pub fn for_tests() -> Self {
        use std::sync::Arc;

        use crate::link::MemoryLinkStore;
        use fieldcrypt::Encryptor;

        let encryptor = Encryptor::new("test-secret-0123456789-0123456789").unwrap();
        Self::new(LinkService::new(
            Arc::new(MemoryLinkStore::new()),
            Arc::new(encryptor),
        ))
    }
}
