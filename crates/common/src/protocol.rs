//! Request and response types exchanged over the public HTTP API.
//!
//! Access tokens are accepted on input but never appear in any response type.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Link endpoints
// ---------------------------------------------------------------------------

/// Request body for `POST /link/items`.
///
/// Carries the result of a completed bank link: the aggregator's access token
/// and item id, plus the accounts reachable through that item.
#[derive(Clone, Serialize, Deserialize)]
pub struct LinkRequest {
    /// Internal id of the owning user.
    pub user_id: i64,
    /// Aggregator access token. Stored encrypted.
    pub access_token: String,
    /// Aggregator item id.
    pub item_id: String,
    #[serde(default)]
    pub institution_id: Option<String>,
    #[serde(default)]
    pub institution_name: Option<String>,
    #[serde(default)]
    pub accounts: Vec<LinkAccountRequest>,
}

impl std::fmt::Debug for LinkRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkRequest")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("item_id", &self.item_id)
            .field("institution_id", &self.institution_id)
            .field("institution_name", &self.institution_name)
            .field("accounts", &self.accounts)
            .finish()
    }
}

/// One bank account inside a [`LinkRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkAccountRequest {
    /// Aggregator account id. Stored encrypted.
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(rename = "type")]
    pub account_type: String,
}

/// A linked item as returned to callers. Never includes the access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkItemResponse {
    pub id: i64,
    pub user_id: i64,
    pub item_id: String,
    pub institution_id: Option<String>,
    pub institution_name: Option<String>,
    #[serde(default)]
    pub accounts: Vec<LinkAccountResponse>,
}

/// A linked account as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkAccountResponse {
    pub id: i64,
    /// Internal id of the parent link item.
    pub link_item_id: i64,
    /// Decrypted aggregator account id.
    pub account_id: String,
    pub name: String,
    pub official_name: Option<String>,
    pub mask: Option<String>,
    pub subtype: Option<String>,
    #[serde(rename = "type")]
    pub account_type: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(e: &crate::ServiceError) -> Self {
        Self::new(e.code(), e.public_message())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"`.
    pub status: String,
    /// Whether the field encryptor was constructed.
    pub encryption_ready: bool,
    /// Number of link items currently stored.
    pub link_items: usize,
}
