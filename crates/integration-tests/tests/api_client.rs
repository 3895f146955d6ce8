#![allow(clippy::unwrap_used)]
//! Integration tests for `ApiClient` and `CatalogClient` against a mock backend.

use std::time::Duration;

use driphub_core::ProductId;
use driphub_integration_tests::{TestBackend, api_path};
use driphub_storefront::api::{ApiError, ApiEvent};
use driphub_storefront::catalog::CatalogClient;
use driphub_storefront::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

// ── Envelope ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_success_envelope() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("orders")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": [1, 2]})))
        .mount(&backend.server)
        .await;

    let response = backend.api.get("orders").await;

    assert!(response.success);
    assert_eq!(response.status, 200);
    assert_eq!(response.message, "Success");
    assert_eq!(response.data, Some(json!({"orders": [1, 2]})));
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_failure_envelope_carries_backend_message() {
    let backend = TestBackend::start().await;

    let body = json!({"message": "Order not found", "code": "E404"});
    Mock::given(method("GET"))
        .and(path(api_path("orders/7")))
        .respond_with(ResponseTemplate::new(404).set_body_json(&body))
        .mount(&backend.server)
        .await;

    let response = backend.api.get("/orders/7").await;

    assert!(!response.success);
    assert_eq!(response.status, 404);
    assert_eq!(response.message, "Order not found");
    assert_eq!(response.error, Some(body));
    assert!(response.data.is_none());
    assert!(!response.is_transport_failure());

    match response.into_result::<serde_json::Value>() {
        Err(ApiError::Status {
            status, message, ..
        }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Order not found");
        }
        other => panic!("expected status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_failure_without_message_uses_default() {
    let backend = TestBackend::start().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("cart/items/3")))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&backend.server)
        .await;

    let response = backend.api.delete("cart/items/3").await;

    assert!(!response.success);
    assert_eq!(response.status, 500);
    assert_eq!(response.message, "An error occurred");
    assert_eq!(response.error, Some(json!("upstream exploded")));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let backend = TestBackend::start().await;

    Mock::given(method("POST"))
        .and(path(api_path("orders")))
        .and(body_json(json!({"items": [{"id": "42", "quantity": 2}]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9001})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let response = backend
        .api
        .post("orders", &json!({"items": [{"id": "42", "quantity": 2}]}))
        .await;

    assert!(response.success);
    assert_eq!(response.status, 201);
    backend.server.verify().await;
}

// ── Headers ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_and_request_id_attached() {
    let backend = TestBackend::start().await;
    backend.seed_tokens("access-1", Some("refresh-1"));

    Mock::given(method("GET"))
        .and(path(api_path("users/profile")))
        .and(header("authorization", "Bearer access-1"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let response = backend.api.get("users/profile").await;

    assert!(response.success);
    backend.server.verify().await;
}

#[tokio::test]
async fn test_request_ids_are_unique_and_no_bearer_without_token() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("categories")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&backend.server)
        .await;

    backend.api.get("categories").await;
    backend.api.get("categories").await;

    let requests = backend.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert!(request.headers.get("authorization").is_none());
    }
    let ids: Vec<_> = requests
        .iter()
        .map(|r| {
            r.headers
                .get("x-request-id")
                .unwrap()
                .to_str()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(ids[0].len(), 36);
    assert_ne!(ids[0], ids[1]);
}

// ── Refresh on 401 ──────────────────────────────────────────────────

async fn mount_profile_by_token(backend: &TestBackend) {
    Mock::given(method("GET"))
        .and(path(api_path("users/profile")))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .mount(&backend.server)
        .await;

    Mock::given(method("GET"))
        .and(path(api_path("users/profile")))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Asha"})))
        .mount(&backend.server)
        .await;
}

#[tokio::test]
async fn test_unauthorized_refreshes_and_replays() {
    let backend = TestBackend::start().await;
    backend.seed_tokens("stale", Some("refresh-1"));
    mount_profile_by_token(&backend).await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/refresh")))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "fresh", "refreshToken": "refresh-2"})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let response = backend.api.get("users/profile").await;

    assert!(response.success);
    assert_eq!(response.data, Some(json!({"id": 1, "name": "Asha"})));
    assert_eq!(backend.stored(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    assert_eq!(backend.stored(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-2"));
    backend.server.verify().await;
}

#[tokio::test]
async fn test_refresh_without_new_refresh_token_keeps_old_one() {
    let backend = TestBackend::start().await;
    backend.seed_tokens("stale", Some("refresh-1"));
    mount_profile_by_token(&backend).await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/refresh")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "fresh"})))
        .mount(&backend.server)
        .await;

    assert!(backend.api.get("users/profile").await.success);
    assert_eq!(backend.stored(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let backend = TestBackend::start().await;
    backend.seed_tokens("stale", Some("refresh-1"));
    mount_profile_by_token(&backend).await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/refresh")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "fresh", "refreshToken": "refresh-2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let (a, b, c) = tokio::join!(
        backend.api.get("users/profile"),
        backend.api.get("users/profile"),
        backend.api.get("users/profile"),
    );

    assert!(a.success && b.success && c.success);
    assert_eq!(backend.stored(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    backend.server.verify().await;
}

#[tokio::test]
async fn test_refresh_failure_clears_tokens_and_signals_expiry() {
    let backend = TestBackend::start().await;
    backend.seed_tokens("stale", Some("revoked"));
    mount_profile_by_token(&backend).await;
    let mut events = backend.api.events();

    Mock::given(method("POST"))
        .and(path(api_path("auth/refresh")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Refresh revoked"})))
        .expect(1)
        .mount(&backend.server)
        .await;

    let response = backend.api.get("users/profile").await;

    assert!(!response.success);
    assert!(response.is_unauthorized());
    assert_eq!(response.message, "Token expired");
    assert!(!backend.api.has_token());
    assert!(backend.stored(REFRESH_TOKEN_KEY).is_none());
    assert_eq!(events.try_recv().unwrap(), ApiEvent::SessionExpired);
    backend.server.verify().await;
}

#[tokio::test]
async fn test_missing_refresh_token_expires_without_calling_refresh() {
    let backend = TestBackend::start().await;
    backend.seed_tokens("stale", None);
    mount_profile_by_token(&backend).await;
    let mut events = backend.api.events();

    Mock::given(method("POST"))
        .and(path(api_path("auth/refresh")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "fresh"})))
        .expect(0)
        .mount(&backend.server)
        .await;

    let response = backend.api.get("users/profile").await;

    assert_eq!(response.status, 401);
    assert!(!backend.api.has_token());
    assert_eq!(events.try_recv().unwrap(), ApiEvent::SessionExpired);
    backend.server.verify().await;
}

#[tokio::test]
async fn test_unauthorized_without_token_is_not_refreshed() {
    let backend = TestBackend::start().await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/login")))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid email or password"})),
        )
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("auth/refresh")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend.server)
        .await;

    let response = backend
        .api
        .post("auth/login", &json!({"email": "a@b.co", "password": "x"}))
        .await;

    assert_eq!(response.status, 401);
    assert_eq!(response.message, "Invalid email or password");
    backend.server.verify().await;
}

#[tokio::test]
async fn test_explicit_refresh() {
    let backend = TestBackend::start().await;
    backend.seed_tokens("stale", Some("refresh-1"));

    Mock::given(method("POST"))
        .and(path(api_path("auth/refresh")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "fresh", "refreshToken": "refresh-2"})),
        )
        .mount(&backend.server)
        .await;

    backend.api.refresh().await.unwrap();

    assert_eq!(backend.stored(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    assert_eq!(backend.stored(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-2"));
}

// ── Catalog ─────────────────────────────────────────────────────────

fn catalog(backend: &TestBackend) -> CatalogClient {
    CatalogClient::new(backend.api.clone(), Duration::from_secs(60))
}

#[tokio::test]
async fn test_product_list_is_cached() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("products")))
        .and(query_param("category", "shoes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                {"id": 1, "name": "Runner", "price": 79.5},
                {"id": "2", "name": "Trail", "price": 99.0, "brand": "Peak"}
            ]
        })))
        .expect(1)
        .mount(&backend.server)
        .await;

    let catalog = catalog(&backend);
    let first = catalog.products(&[("category", "shoes")]).await.unwrap();
    let second = catalog.products(&[("category", "shoes")]).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(first[0].id, ProductId::from("1"));
    assert_eq!(first[1].extra.get("brand"), Some(&json!("Peak")));
    backend.server.verify().await;
}

#[tokio::test]
async fn test_failed_product_fetch_is_not_cached() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("products/42")))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "Maintenance"})))
        .up_to_n_times(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("products/42")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": {"id": 42, "name": "Denim Jacket", "price": 59.99}
        })))
        .mount(&backend.server)
        .await;

    let catalog = catalog(&backend);
    let id = ProductId::from("42");

    let err = catalog.product(&id).await.unwrap_err();
    assert_eq!(err.status(), Some(503));

    let product = catalog.product(&id).await.unwrap();
    assert_eq!(product.name, "Denim Jacket");
    catalog.product(&id).await.unwrap();

    assert_eq!(backend.server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_is_not_cached() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("search/products")))
        .and(query_param("q", "denim jacket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 42, "name": "Denim Jacket", "price": 59.99}
        ])))
        .expect(2)
        .mount(&backend.server)
        .await;

    let catalog = catalog(&backend);
    assert_eq!(catalog.search("denim jacket").await.unwrap().len(), 1);
    assert_eq!(catalog.search("denim jacket").await.unwrap().len(), 1);
    backend.server.verify().await;
}

#[tokio::test]
async fn test_categories_cached_until_invalidated() {
    let backend = TestBackend::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("categories")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [{"id": 1, "name": "Shoes"}, {"id": 2, "name": "Jackets"}]
        })))
        .expect(2)
        .mount(&backend.server)
        .await;

    let catalog = catalog(&backend);
    assert_eq!(catalog.categories().await.unwrap().len(), 2);
    assert_eq!(catalog.categories().await.unwrap().len(), 2);
    catalog.invalidate_all().await;
    assert_eq!(catalog.categories().await.unwrap()[1].name, "Jackets");
    backend.server.verify().await;
}
