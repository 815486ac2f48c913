//! Axum request handlers for all service endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{ErrorResponse, HealthResponse, LinkAccountResponse, LinkItemResponse, LinkRequest},
    ServiceError,
};
use tracing::{info, warn};

use super::state::AppState;
use crate::link::{LinkError, LinkItem};

/// `GET /health` — liveness and readiness check.
///
/// The encryptor is built before the router exists, so a running server is
/// always encryption-ready; the store is probed by counting link items.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.links.item_count() {
        Ok(link_items) => {
            let body = HealthResponse {
                status: "ok".into(),
                encryption_ready: true,
                link_items,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "health check could not reach link store");
            let body = HealthResponse {
                status: "degraded".into(),
                encryption_ready: true,
                link_items: 0,
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// `POST /link/items` — store a linked item and its accounts.
///
/// The access token and account ids are encrypted before they reach the
/// store. The response never contains the access token.
pub async fn create_link(
    State(state): State<AppState>,
    Json(req): Json<LinkRequest>,
) -> Response {
    let user_id = req.user_id;
    match state.links.link(req) {
        Ok((item, accounts)) => {
            info!(user_id, link_item_id = item.id, accounts = accounts.len(), "bank link saved");
            (StatusCode::CREATED, Json(item.to_response(&accounts))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// `GET /users/:user_id/link/items` — a user's items with their accounts.
pub async fn list_items(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    let result = state.links.items_for_user(user_id).and_then(|items| {
        items
            .iter()
            .map(|item| item_response(&state, item))
            .collect::<Result<Vec<_>, _>>()
    });
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /users/:user_id/link/accounts` — every account the user has linked.
pub async fn list_accounts(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    match state.links.accounts_for_user(user_id) {
        Ok(accounts) => {
            let body: Vec<LinkAccountResponse> =
                accounts.iter().map(|acc| acc.to_response()).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// `GET /link/items/:id` — one item with its accounts.
pub async fn get_item(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state
        .links
        .item(id)
        .and_then(|item| item_response(&state, &item))
    {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(e),
    }
}

/// `GET /users/:user_id/link/accounts/:account_id` — look up an account by
/// its aggregator id.
pub async fn get_account(
    State(state): State<AppState>,
    Path((user_id, account_id)): Path<(i64, String)>,
) -> Response {
    match state.links.account_by_account_id(user_id, &account_id) {
        Ok(account) => (StatusCode::OK, Json(account.to_response())).into_response(),
        Err(e) => error_response(e),
    }
}

/// `DELETE /users/:user_id/link/accounts/:account_id` — unlink one account.
pub async fn delete_account(
    State(state): State<AppState>,
    Path((user_id, account_id)): Path<(i64, String)>,
) -> Response {
    match state.links.delete_account_by_account_id(user_id, &account_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// `DELETE /link/items/:id` — remove an item and its accounts.
pub async fn delete_item(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.links.delete_item(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn item_response(state: &AppState, item: &LinkItem) -> Result<LinkItemResponse, LinkError> {
    let accounts = state.links.accounts_for_item(item.id)?;
    Ok(item.to_response(&accounts))
}

/// Map a domain error to a JSON error body. Server-side failures are logged
/// here and reach the caller only as a generic `internal_error`.
fn error_response(err: LinkError) -> Response {
    let err = ServiceError::from(err);
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!(error = %err, "request failed");
    }
    (status, Json(ErrorResponse::from(&err))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use fieldcrypt::CryptoError;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/health", get(health))
            .with_state(AppState::for_tests())
    }

    #[tokio::test]
    async fn health_returns_200_with_empty_store() {
        let app = test_router();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn crypto_failure_is_opaque_500() {
        let resp = error_response(LinkError::Crypto(CryptoError::DecryptionFailed));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.code, "internal_error");
        assert!(!body.message.contains("decrypt"));
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = error_response(LinkError::NotFound("link item 1".into()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_input_maps_to_400() {
        let resp = error_response(LinkError::Invalid("access_token must not be empty"));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
