//! [`LinkService`]: link item and account operations with transparent
//! encryption of the access token and aggregator account id columns.

use std::sync::Arc;

use common::protocol::LinkRequest;
use fieldcrypt::Encryptor;
use tracing::{error, info, warn};

use super::{
    model::{
        non_empty, LinkAccount, LinkAccountParams, LinkAccountRow, LinkItem, LinkItemParams,
        LinkItemRow, NewLinkAccount, NewLinkItem,
    },
    LinkError, LinkStore,
};

const ACCESS_TOKEN: &str = "access_token";
const ACCOUNT_ID: &str = "account_id";

/// Link operations over a [`LinkStore`], encrypting protected columns with
/// the injected [`Encryptor`].
///
/// Cheap to share: both collaborators are behind `Arc`.
#[derive(Clone)]
pub struct LinkService {
    store: Arc<dyn LinkStore>,
    encryptor: Arc<Encryptor>,
}

impl LinkService {
    pub fn new(store: Arc<dyn LinkStore>, encryptor: Arc<Encryptor>) -> Self {
        Self { store, encryptor }
    }

    /// Number of stored link items.
    pub fn item_count(&self) -> Result<usize, LinkError> {
        Ok(self.store.item_count()?)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Encrypt the access token, store the item, and return it as read back
    /// from the store.
    pub fn create_item(&self, new: NewLinkItem) -> Result<LinkItem, LinkError> {
        if new.access_token.is_empty() {
            return Err(LinkError::Invalid("access_token must not be empty"));
        }
        if new.item_id.trim().is_empty() {
            return Err(LinkError::Invalid("item_id must not be empty"));
        }

        let access_token = self.conceal(&new.access_token, ACCESS_TOKEN)?;
        let row = self.store.insert_item(LinkItemParams {
            user_id: new.user_id,
            access_token,
            item_id: new.item_id,
            institution_id: non_empty(new.institution_id),
            institution_name: non_empty(new.institution_name),
        })?;
        info!(link_item_id = row.id, user_id = row.user_id, "link item stored");

        self.open_item(row)
    }

    pub fn item(&self, id: i64) -> Result<LinkItem, LinkError> {
        let row = self
            .store
            .get_item(id)?
            .ok_or_else(|| LinkError::NotFound(format!("link item {id}")))?;
        self.open_item(row)
    }

    pub fn item_by_item_id(&self, item_id: &str) -> Result<LinkItem, LinkError> {
        let row = self
            .store
            .get_item_by_item_id(item_id)?
            .ok_or_else(|| LinkError::NotFound(format!("link item {item_id}")))?;
        self.open_item(row)
    }

    pub fn items_for_user(&self, user_id: i64) -> Result<Vec<LinkItem>, LinkError> {
        self.store
            .list_items_by_user(user_id)?
            .into_iter()
            .map(|row| self.open_item(row))
            .collect()
    }

    /// Delete an item together with its accounts.
    pub fn delete_item(&self, id: i64) -> Result<(), LinkError> {
        if !self.store.delete_item(id)? {
            return Err(LinkError::NotFound(format!("link item {id}")));
        }
        info!(link_item_id = id, "link item deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// Encrypt the aggregator account id and store the account under `item`.
    pub fn create_account(
        &self,
        item: &LinkItem,
        new: NewLinkAccount,
    ) -> Result<LinkAccount, LinkError> {
        if new.account_id.is_empty() {
            return Err(LinkError::Invalid("account_id must not be empty"));
        }

        let account_id = self.conceal(&new.account_id, ACCOUNT_ID)?;
        let row = self.store.insert_account(LinkAccountParams {
            link_item_id: item.id,
            user_id: item.user_id,
            account_id,
            name: new.name,
            official_name: non_empty(new.official_name),
            mask: non_empty(new.mask),
            subtype: non_empty(new.subtype),
            account_type: new.account_type,
        })?;

        self.open_account(row)
    }

    /// Store every account in `accounts` under `item`, stopping at the first
    /// failure.
    pub fn save_accounts(
        &self,
        item: &LinkItem,
        accounts: Vec<NewLinkAccount>,
    ) -> Result<Vec<LinkAccount>, LinkError> {
        accounts
            .into_iter()
            .map(|acc| self.create_account(item, acc))
            .collect()
    }

    pub fn account(&self, id: i64) -> Result<LinkAccount, LinkError> {
        let row = self
            .store
            .get_account(id)?
            .ok_or_else(|| LinkError::NotFound(format!("link account {id}")))?;
        self.open_account(row)
    }

    pub fn accounts_for_item(&self, link_item_id: i64) -> Result<Vec<LinkAccount>, LinkError> {
        self.store
            .list_accounts_by_item(link_item_id)?
            .into_iter()
            .map(|row| self.open_account(row))
            .collect()
    }

    pub fn accounts_for_user(&self, user_id: i64) -> Result<Vec<LinkAccount>, LinkError> {
        self.store
            .list_accounts_by_user(user_id)?
            .into_iter()
            .map(|row| self.open_account(row))
            .collect()
    }

    /// Find one of `user_id`'s accounts by its plaintext aggregator id.
    ///
    /// Envelopes are randomised, so the stored column cannot be matched
    /// against a fresh encryption of `account_id`; each candidate is
    /// decrypted and compared instead.
    pub fn account_by_account_id(
        &self,
        user_id: i64,
        account_id: &str,
    ) -> Result<LinkAccount, LinkError> {
        for account in self.accounts_for_user(user_id)? {
            if account.account_id == account_id {
                return Ok(account);
            }
        }
        Err(LinkError::NotFound("link account".into()))
    }

    pub fn delete_account_by_account_id(
        &self,
        user_id: i64,
        account_id: &str,
    ) -> Result<(), LinkError> {
        let account = self.account_by_account_id(user_id, account_id)?;
        if !self.store.delete_account(account.id)? {
            return Err(LinkError::NotFound(format!("link account {}", account.id)));
        }
        info!(link_account_id = account.id, "link account deleted");
        Ok(())
    }

    /// Decrypted access token of the item that owns `account_id`.
    pub fn access_token_for_account(
        &self,
        user_id: i64,
        account_id: &str,
    ) -> Result<String, LinkError> {
        let account = self.account_by_account_id(user_id, account_id)?;
        Ok(self.item(account.link_item_id)?.access_token)
    }

    // -----------------------------------------------------------------------
    // Composite
    // -----------------------------------------------------------------------

    /// Store a freshly linked item and all of its accounts.
    ///
    /// If any account cannot be stored, the item (and the accounts already
    /// written under it) are removed again.
    pub fn link(&self, req: LinkRequest) -> Result<(LinkItem, Vec<LinkAccount>), LinkError> {
        let item = self.create_item(NewLinkItem {
            user_id: req.user_id,
            access_token: req.access_token,
            item_id: req.item_id,
            institution_id: req.institution_id,
            institution_name: req.institution_name,
        })?;

        let accounts = req.accounts.into_iter().map(NewLinkAccount::from).collect();
        match self.save_accounts(&item, accounts) {
            Ok(accounts) => Ok((item, accounts)),
            Err(e) => {
                warn!(link_item_id = item.id, error = %e, "saving accounts failed; removing link item");
                if let Err(cleanup) = self.store.delete_item(item.id) {
                    error!(link_item_id = item.id, error = %cleanup, "failed to remove partial link item");
                }
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Protected column helpers
    // -----------------------------------------------------------------------

    fn open_item(&self, row: LinkItemRow) -> Result<LinkItem, LinkError> {
        let access_token = self.reveal(&row.access_token, ACCESS_TOKEN, row.id)?;
        Ok(LinkItem {
            id: row.id,
            user_id: row.user_id,
            access_token,
            item_id: row.item_id,
            institution_id: row.institution_id,
            institution_name: row.institution_name,
        })
    }

    fn open_account(&self, row: LinkAccountRow) -> Result<LinkAccount, LinkError> {
        let account_id = self.reveal(&row.account_id, ACCOUNT_ID, row.id)?;
        Ok(LinkAccount {
            id: row.id,
            link_item_id: row.link_item_id,
            user_id: row.user_id,
            account_id,
            name: row.name,
            official_name: row.official_name,
            mask: row.mask,
            subtype: row.subtype,
            account_type: row.account_type,
        })
    }

    fn conceal(&self, plaintext: &str, column: &'static str) -> Result<String, LinkError> {
        self.encryptor.encrypt(plaintext).map_err(|e| {
            error!(column, error = %e, "failed to encrypt protected column");
            LinkError::Crypto(e)
        })
    }

    fn reveal(&self, stored: &str, column: &'static str, row_id: i64) -> Result<String, LinkError> {
        self.encryptor.decrypt(stored).map_err(|e| {
            error!(row_id, column, error = %e, "protected column failed to decrypt");
            LinkError::Crypto(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{store::MockLinkStore, MemoryLinkStore, StoreError};
    use common::protocol::LinkAccountRequest;
    use fieldcrypt::CryptoError;
    use mockall::predicate::eq;

    const SECRET: &str = "12345678901234567890123456789012";

    fn encryptor() -> Arc<Encryptor> {
        Arc::new(Encryptor::new(SECRET).unwrap())
    }

    fn service() -> (LinkService, MemoryLinkStore) {
        let store = MemoryLinkStore::new();
        let svc = LinkService::new(Arc::new(store.clone()), encryptor());
        (svc, store)
    }

    fn new_item(user_id: i64, item_id: &str) -> NewLinkItem {
        NewLinkItem {
            user_id,
            access_token: format!("access-sandbox-{item_id}"),
            item_id: item_id.into(),
            institution_id: Some("ins_1".into()),
            institution_name: Some("First Bank".into()),
        }
    }

    fn new_account(account_id: &str) -> NewLinkAccount {
        NewLinkAccount {
            account_id: account_id.into(),
            name: "Checking".into(),
            official_name: None,
            mask: Some("1234".into()),
            subtype: Some("checking".into()),
            account_type: "depository".into(),
        }
    }

    #[test]
    fn access_token_is_stored_encrypted() {
        let (svc, store) = service();
        let item = svc.create_item(new_item(1, "item-a")).unwrap();
        assert_eq!(item.access_token, "access-sandbox-item-a");

        let row = store.get_item(item.id).unwrap().unwrap();
        assert_ne!(row.access_token, "access-sandbox-item-a");
        assert_eq!(
            encryptor().decrypt(&row.access_token).unwrap(),
            "access-sandbox-item-a"
        );
    }

    #[test]
    fn account_id_is_stored_encrypted() {
        let (svc, store) = service();
        let item = svc.create_item(new_item(1, "item-a")).unwrap();
        let acc = svc.create_account(&item, new_account("acc-123")).unwrap();
        assert_eq!(acc.account_id, "acc-123");

        let row = store.get_account(acc.id).unwrap().unwrap();
        assert_ne!(row.account_id, "acc-123");
    }

    #[test]
    fn reads_decrypt() {
        let (svc, _) = service();
        let created = svc.create_item(new_item(7, "item-a")).unwrap();
        assert_eq!(svc.item(created.id).unwrap(), created);
        assert_eq!(svc.item_by_item_id("item-a").unwrap(), created);
        assert_eq!(svc.items_for_user(7).unwrap(), vec![created]);
        assert!(svc.items_for_user(8).unwrap().is_empty());
    }

    #[test]
    fn empty_access_token_rejected() {
        let (svc, store) = service();
        let mut new = new_item(1, "item-a");
        new.access_token.clear();
        assert!(matches!(svc.create_item(new), Err(LinkError::Invalid(_))));
        assert_eq!(store.item_count().unwrap(), 0);
    }

    #[test]
    fn missing_item_is_not_found() {
        let (svc, _) = service();
        assert!(matches!(svc.item(99), Err(LinkError::NotFound(_))));
        assert!(matches!(svc.delete_item(99), Err(LinkError::NotFound(_))));
    }

    #[test]
    fn lookup_by_plaintext_account_id() {
        let (svc, _) = service();
        let item = svc.create_item(new_item(1, "item-a")).unwrap();
        svc.save_accounts(&item, vec![new_account("acc-1"), new_account("acc-2")])
            .unwrap();

        let found = svc.account_by_account_id(1, "acc-2").unwrap();
        assert_eq!(found.account_id, "acc-2");
        assert!(matches!(
            svc.account_by_account_id(2, "acc-2"),
            Err(LinkError::NotFound(_))
        ));
    }

    #[test]
    fn access_token_for_account_resolves_owning_item() {
        let (svc, _) = service();
        let a = svc.create_item(new_item(1, "item-a")).unwrap();
        let b = svc.create_item(new_item(1, "item-b")).unwrap();
        svc.create_account(&a, new_account("acc-a")).unwrap();
        svc.create_account(&b, new_account("acc-b")).unwrap();

        assert_eq!(
            svc.access_token_for_account(1, "acc-b").unwrap(),
            "access-sandbox-item-b"
        );
    }

    #[test]
    fn delete_account_by_account_id() {
        let (svc, _) = service();
        let item = svc.create_item(new_item(1, "item-a")).unwrap();
        svc.create_account(&item, new_account("acc-1")).unwrap();

        svc.delete_account_by_account_id(1, "acc-1").unwrap();
        assert!(svc.accounts_for_item(item.id).unwrap().is_empty());
    }

    #[test]
    fn link_stores_item_and_accounts() {
        let (svc, _) = service();
        let (item, accounts) = svc
            .link(LinkRequest {
                user_id: 3,
                access_token: "access-sandbox-xyz".into(),
                item_id: "item-xyz".into(),
                institution_id: None,
                institution_name: Some("Credit Union".into()),
                accounts: vec![LinkAccountRequest {
                    account_id: "acc-xyz".into(),
                    name: "Savings".into(),
                    official_name: None,
                    mask: None,
                    subtype: Some("savings".into()),
                    account_type: "depository".into(),
                }],
            })
            .unwrap();

        assert_eq!(item.user_id, 3);
        assert_eq!(accounts.len(), 1);
        assert_eq!(svc.accounts_for_user(3).unwrap(), accounts);
    }

    #[test]
    fn link_rolls_back_item_when_an_account_fails() {
        let (svc, store) = service();
        let result = svc.link(LinkRequest {
            user_id: 3,
            access_token: "access-sandbox-xyz".into(),
            item_id: "item-xyz".into(),
            institution_id: None,
            institution_name: None,
            accounts: vec![LinkAccountRequest {
                account_id: String::new(),
                name: "Savings".into(),
                official_name: None,
                mask: None,
                subtype: None,
                account_type: "depository".into(),
            }],
        });
        assert!(matches!(result, Err(LinkError::Invalid(_))));
        assert_eq!(store.item_count().unwrap(), 0);
    }

    #[test]
    fn tampered_row_fails_closed() {
        let mut stored = encryptor().encrypt("access-sandbox-real").unwrap();
        // Swap one base64 character inside the nonce.
        let replacement = if stored.starts_with('A') { "B" } else { "A" };
        stored.replace_range(0..1, replacement);

        let row = LinkItemRow {
            id: 5,
            user_id: 1,
            access_token: stored,
            item_id: "item-a".into(),
            institution_id: None,
            institution_name: None,
        };
        let mut mock = MockLinkStore::new();
        mock.expect_get_item()
            .with(eq(5))
            .returning(move |_| Ok(Some(row.clone())));

        let svc = LinkService::new(Arc::new(mock), encryptor());
        assert!(matches!(
            svc.item(5),
            Err(LinkError::Crypto(CryptoError::DecryptionFailed))
        ));
    }

    #[test]
    fn row_from_other_key_fails_closed() {
        let foreign = Encryptor::new("another-secret-of-sufficient-length!")
            .unwrap()
            .encrypt("acc-1")
            .unwrap();
        let row = LinkAccountRow {
            id: 2,
            link_item_id: 1,
            user_id: 1,
            account_id: foreign,
            name: "Checking".into(),
            official_name: None,
            mask: None,
            subtype: None,
            account_type: "depository".into(),
        };
        let mut mock = MockLinkStore::new();
        mock.expect_list_accounts_by_user()
            .with(eq(1))
            .returning(move |_| Ok(vec![row.clone()]));

        let svc = LinkService::new(Arc::new(mock), encryptor());
        assert!(matches!(
            svc.accounts_for_user(1),
            Err(LinkError::Crypto(CryptoError::DecryptionFailed))
        ));
    }

    #[test]
    fn store_failure_is_propagated() {
        let mut mock = MockLinkStore::new();
        mock.expect_insert_item()
            .returning(|_| Err(StoreError::Backend("connection reset".into())));

        let svc = LinkService::new(Arc::new(mock), encryptor());
        assert!(matches!(
            svc.create_item(new_item(1, "item-a")),
            Err(LinkError::Store(StoreError::Backend(_)))
        ));
    }
}
