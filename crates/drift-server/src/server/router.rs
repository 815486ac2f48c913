//! Axum router construction.

use axum::{
    routing::{get, post},
    Router,
};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/link/items", post(handlers::create_link))
        .route(
            "/link/items/:id",
            get(handlers::get_item).delete(handlers::delete_item),
        )
        .route("/users/:user_id/link/items", get(handlers::list_items))
        .route("/users/:user_id/link/accounts", get(handlers::list_accounts))
        .route(
            "/users/:user_id/link/accounts/:account_id",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .fallback(handlers::not_found);

    middleware::apply(routes).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use axum_test::TestServer;
    use common::protocol::{
        HealthResponse, LinkAccountRequest, LinkAccountResponse, LinkItemResponse, LinkRequest,
    };
    use tower::ServiceExt;

    fn link_request(user_id: i64, item_id: &str) -> LinkRequest {
        LinkRequest {
            user_id,
            access_token: format!("access-sandbox-{item_id}"),
            item_id: item_id.into(),
            institution_id: Some("ins_109508".into()),
            institution_name: Some("First Platypus Bank".into()),
            accounts: vec![
                LinkAccountRequest {
                    account_id: format!("{item_id}-chk"),
                    name: "Plaid Checking".into(),
                    official_name: Some("Plaid Gold Standard 0% Interest Checking".into()),
                    mask: Some("0000".into()),
                    subtype: Some("checking".into()),
                    account_type: "depository".into(),
                },
                LinkAccountRequest {
                    account_id: format!("{item_id}-sav"),
                    name: "Plaid Saving".into(),
                    official_name: None,
                    mask: Some("1111".into()),
                    subtype: Some("savings".into()),
                    account_type: "depository".into(),
                },
            ],
        }
    }

    fn server() -> TestServer {
        TestServer::new(build(AppState::for_tests())).unwrap()
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(AppState::for_tests());
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn health_route_exists() {
        let resp = server().get("/health").await;
        resp.assert_status_ok();
        let body: HealthResponse = resp.json();
        assert!(body.encryption_ready);
        assert_eq!(body.link_items, 0);
    }

    #[tokio::test]
    async fn create_link_hides_access_token() {
        let server = server();
        let resp = server
            .post("/link/items")
            .json(&link_request(1, "item-a"))
            .await;
        resp.assert_status(StatusCode::CREATED);
        assert!(!resp.text().contains("access-sandbox-item-a"));

        let item: LinkItemResponse = resp.json();
        assert_eq!(item.item_id, "item-a");
        assert_eq!(item.accounts.len(), 2);
        assert_eq!(item.accounts[0].account_id, "item-a-chk");
    }

    #[tokio::test]
    async fn duplicate_item_is_conflict() {
        let server = server();
        server
            .post("/link/items")
            .json(&link_request(1, "item-a"))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/link/items")
            .json(&link_request(1, "item-a"))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn empty_access_token_is_bad_request() {
        let mut req = link_request(1, "item-a");
        req.access_token.clear();
        server()
            .post("/link/items")
            .json(&req)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lists_are_scoped_to_user() {
        let server = server();
        server
            .post("/link/items")
            .json(&link_request(1, "item-a"))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/link/items")
            .json(&link_request(2, "item-b"))
            .await
            .assert_status(StatusCode::CREATED);

        let items: Vec<LinkItemResponse> = server.get("/users/1/link/items").await.json();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id, "item-a");
        assert_eq!(items[0].accounts.len(), 2);

        let accounts: Vec<LinkAccountResponse> =
            server.get("/users/2/link/accounts").await.json();
        let ids: Vec<&str> = accounts.iter().map(|a| a.account_id.as_str()).collect();
        assert_eq!(ids, ["item-b-chk", "item-b-sav"]);
    }

    #[tokio::test]
    async fn delete_item_then_404() {
        let server = server();
        let item: LinkItemResponse = server
            .post("/link/items")
            .json(&link_request(1, "item-a"))
            .await
            .json();

        let path = format!("/link/items/{}", item.id);
        server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        server.delete(&path).await.assert_status_not_found();

        let accounts: Vec<LinkAccountResponse> =
            server.get("/users/1/link/accounts").await.json();
        assert!(accounts.is_empty());
    }

    #[tokio::test]
    async fn get_item_by_id() {
        let server = server();
        let created: LinkItemResponse = server
            .post("/link/items")
            .json(&link_request(4, "item-a"))
            .await
            .json();

        let fetched: LinkItemResponse = server
            .get(&format!("/link/items/{}", created.id))
            .await
            .json();
        assert_eq!(fetched.item_id, "item-a");
        assert_eq!(fetched.accounts.len(), 2);

        server.get("/link/items/999").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn account_lookup_and_unlink_by_aggregator_id() {
        let server = server();
        server
            .post("/link/items")
            .json(&link_request(5, "item-a"))
            .await
            .assert_status(StatusCode::CREATED);

        let acc: LinkAccountResponse = server
            .get("/users/5/link/accounts/item-a-sav")
            .await
            .json();
        assert_eq!(acc.mask.as_deref(), Some("1111"));

        // Another user cannot see it.
        server
            .get("/users/6/link/accounts/item-a-sav")
            .await
            .assert_status_not_found();

        server
            .delete("/users/5/link/accounts/item-a-sav")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get("/users/5/link/accounts/item-a-sav")
            .await
            .assert_status_not_found();
    }
}
