//! [`LinkStore`]: persistence seam for link rows, and [`MemoryLinkStore`],
//! the thread-safe in-process implementation.
//!
//! Stores only ever see envelopes in protected columns.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use thiserror::Error;

use super::model::{LinkAccountParams, LinkAccountRow, LinkItemParams, LinkItemRow};

/// Errors produced by a link store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row with the same unique key already exists.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// An account referenced a link item that does not exist.
    #[error("link item {0} does not exist")]
    UnknownItem(i64),

    /// The backing store failed.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Row-level operations the link service needs from its storage backend.
#[cfg_attr(test, mockall::automock)]
pub trait LinkStore: Send + Sync {
    /// Insert an item row. The external `item_id` must be unique.
    fn insert_item(&self, params: LinkItemParams) -> Result<LinkItemRow, StoreError>;

    fn get_item(&self, id: i64) -> Result<Option<LinkItemRow>, StoreError>;

    fn get_item_by_item_id(&self, item_id: &str) -> Result<Option<LinkItemRow>, StoreError>;

    fn list_items_by_user(&self, user_id: i64) -> Result<Vec<LinkItemRow>, StoreError>;

    /// Delete an item row and every account under it. Returns `false` if no
    /// item had that id.
    fn delete_item(&self, id: i64) -> Result<bool, StoreError>;

    fn item_count(&self) -> Result<usize, StoreError>;

    /// Insert an account row under an existing item.
    fn insert_account(&self, params: LinkAccountParams) -> Result<LinkAccountRow, StoreError>;

    fn get_account(&self, id: i64) -> Result<Option<LinkAccountRow>, StoreError>;

    fn list_accounts_by_item(&self, link_item_id: i64) -> Result<Vec<LinkAccountRow>, StoreError>;

    fn list_accounts_by_user(&self, user_id: i64) -> Result<Vec<LinkAccountRow>, StoreError>;

    /// Returns `false` if no account had that id.
    fn delete_account(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    items: BTreeMap<i64, LinkItemRow>,
    accounts: BTreeMap<i64, LinkAccountRow>,
    next_item_id: i64,
    next_account_id: i64,
}

/// In-memory [`LinkStore`].
///
/// Wraps an `Arc<RwLock<_>>` so clones share the same tables and many readers
/// proceed concurrently. Ids are assigned sequentially from 1.
#[derive(Clone, Debug, Default)]
pub struct MemoryLinkStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryLinkStore {
    /// Create a new, empty [`MemoryLinkStore`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkStore for MemoryLinkStore {
    fn insert_item(&self, params: LinkItemParams) -> Result<LinkItemRow, StoreError> {
        let mut t = self.inner.write();
        if t.items.values().any(|row| row.item_id == params.item_id) {
            return Err(StoreError::Duplicate(format!("item {}", params.item_id)));
        }
        t.next_item_id += 1;
        let row = LinkItemRow {
            id: t.next_item_id,
            user_id: params.user_id,
            access_token: params.access_token,
            item_id: params.item_id,
            institution_id: params.institution_id,
            institution_name: params.institution_name,
        };
        t.items.insert(row.id, row.clone());
        Ok(row)
    }

    fn get_item(&self, id: i64) -> Result<Option<LinkItemRow>, StoreError> {
        Ok(self.inner.read().items.get(&id).cloned())
    }

    fn get_item_by_item_id(&self, item_id: &str) -> Result<Option<LinkItemRow>, StoreError> {
        Ok(self
            .inner
            .read()
            .items
            .values()
            .find(|row| row.item_id == item_id)
            .cloned())
    }

    fn list_items_by_user(&self, user_id: i64) -> Result<Vec<LinkItemRow>, StoreError> {
        Ok(self
            .inner
            .read()
            .items
            .values()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect())
    }

    fn delete_item(&self, id: i64) -> Result<bool, StoreError> {
        let mut t = self.inner.write();
        if t.items.remove(&id).is_none() {
            return Ok(false);
        }
        t.accounts.retain(|_, acc| acc.link_item_id != id);
        Ok(true)
    }

    fn item_count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().items.len())
    }

    fn insert_account(&self, params: LinkAccountParams) -> Result<LinkAccountRow, StoreError> {
        let mut t = self.inner.write();
        if !t.items.contains_key(&params.link_item_id) {
            return Err(StoreError::UnknownItem(params.link_item_id));
        }
        t.next_account_id += 1;
        let row = LinkAccountRow {
            id: t.next_account_id,
            link_item_id: params.link_item_id,
            user_id: params.user_id,
            account_id: params.account_id,
            name: params.name,
            official_name: params.official_name,
            mask: params.mask,
            subtype: params.subtype,
            account_type: params.account_type,
        };
        t.accounts.insert(row.id, row.clone());
        Ok(row)
    }

    fn get_account(&self, id: i64) -> Result<Option<LinkAccountRow>, StoreError> {
        Ok(self.inner.read().accounts.get(&id).cloned())
    }

    fn list_accounts_by_item(&self, link_item_id: i64) -> Result<Vec<LinkAccountRow>, StoreError> {
        Ok(self
            .inner
            .read()
            .accounts
            .values()
            .filter(|acc| acc.link_item_id == link_item_id)
            .cloned()
            .collect())
    }

    fn list_accounts_by_user(&self, user_id: i64) -> Result<Vec<LinkAccountRow>, StoreError> {
        Ok(self
            .inner
            .read()
            .accounts
            .values()
            .filter(|acc| acc.user_id == user_id)
            .cloned()
            .collect())
    }

    fn delete_account(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.write().accounts.remove(&id).is_some())
    }
}
