//! Row and domain types for link items and link accounts.
//!
//! `*Row` types are what the store holds: their protected columns contain
//! envelopes. The plain types carry decrypted values and are only built by
//! [`super::LinkService`].

use std::fmt;

use common::protocol::{LinkAccountRequest, LinkAccountResponse, LinkItemResponse};

/// Stored link item. `access_token` is an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkItemRow {
    pub id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub item_id: String,
    pub institution_id: Option<String>,
    pub institution_name: Option<String>,
}

/// Insert parameters for a link item row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkItemParams {
    pub user_id: i64,
    pub access_token: String,
    pub item_id: String,
    pub institution_id: Option<String>,
    pub institution_name: Option<String>,
}

/// Stored link account. `account_id` is an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAccountRow {
    pub id: i64,
    pub link_item_id: i64,
    pub user_id: i64,
    pub account_id: String,
    pub name: String,
    pub official_name: Option<String>,
    pub mask: Option<String>,
    pub subtype: Option<String>,
    pub account_type: String,
}

/// Insert parameters for a link account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAccountParams {
    pub link_item_id: i64,
    pub user_id: i64,
    pub account_id: String,
    pub name: String,
    pub official_name: Option<String>,
    pub mask: Option<String>,
    pub subtype: Option<String>,
    pub account_type: String,
}

/// A link item with its access token decrypted.
#[derive(Clone, PartialEq, Eq)]
pub struct LinkItem {
    pub id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub item_id: String,
    pub institution_id: Option<String>,
    pub institution_name: Option<String>,
}

impl fmt::Debug for LinkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkItem")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("item_id", &self.item_id)
            .field("institution_id", &self.institution_id)
            .field("institution_name", &self.institution_name)
            .finish()
    }
}

impl LinkItem {
    /// Public view of the item; the access token is dropped.
    pub fn to_response(&self, accounts: &[LinkAccount]) -> LinkItemResponse {
        LinkItemResponse {
            id: self.id,
            user_id: self.user_id,
            item_id: self.item_id.clone(),
            institution_id: self.institution_id.clone(),
            institution_name: self.institution_name.clone(),
            accounts: accounts.iter().map(LinkAccount::to_response).collect(),
        }
    }
}

/// A link account with its aggregator account id decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAccount {
    pub id: i64,
    pub link_item_id: i64,
    pub user_id: i64,
    pub account_id: String,
    pub name: String,
    pub official_name: Option<String>,
    pub mask: Option<String>,
    pub subtype: Option<String>,
    pub account_type: String,
}

impl LinkAccount {
    pub fn to_response(&self) -> LinkAccountResponse {
        LinkAccountResponse {
            id: self.id,
            link_item_id: self.link_item_id,
            account_id: self.account_id.clone(),
            name: self.name.clone(),
            official_name: self.official_name.clone(),
            mask: self.mask.clone(),
            subtype: self.subtype.clone(),
            account_type: self.account_type.clone(),
        }
    }
}

/// Input for creating a link item.
#[derive(Clone)]
pub struct NewLinkItem {
    pub user_id: i64,
    pub access_token: String,
    pub item_id: String,
    pub institution_id: Option<String>,
    pub institution_name: Option<String>,
}

impl fmt::Debug for NewLinkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewLinkItem")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("item_id", &self.item_id)
            .finish_non_exhaustive()
    }
}

/// Input for creating a link account under an existing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLinkAccount {
    pub account_id: String,
    pub name: String,
    pub official_name: Option<String>,
    pub mask: Option<String>,
    pub subtype: Option<String>,
    pub account_type: String,
}

impl From<LinkAccountRequest> for NewLinkAccount {
    fn from(req: LinkAccountRequest) -> Self {
        Self {
            account_id: req.account_id,
            name: req.name,
            official_name: non_empty(req.official_name),
            mask: non_empty(req.mask),
            subtype: non_empty(req.subtype),
            account_type: req.account_type,
        }
    }
}

/// Empty optional strings are stored as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
