use super::*;
use crate::auth::gateway::AuthPhase;
use crate::routes::Route;
use crate::test_helpers::{
    ManualClock, MockTransport, NOW, RecordingNavigator, store_with, token_expiring_in,
};
use serde_json::json;

struct Harness {
    transport: Arc<MockTransport>,
    navigator: Arc<RecordingNavigator>,
    store: Arc<TokenStore>,
    client: ApiClient,
}

fn harness(token: Option<String>) -> Harness {
    let transport = MockTransport::new();
    let navigator = RecordingNavigator::new();
    let store = store_with(token);
    let gateway = Arc::new(AuthGateway::new(transport.clone(), store.clone(), navigator.clone()));
    let oracle = SessionOracle::new(store.clone(), ManualClock::at(NOW));
    let client = ApiClient::new(transport.clone(), gateway, oracle, store.clone());
    Harness { transport, navigator, store, client }
}

const DEALS: &str = "/api/deals";

// =============================================================================
// Bearer attachment
// =============================================================================

#[tokio::test]
async fn no_token_forwards_request_unmodified() {
    let h = harness(None);
    h.transport.push_status(200, &json!([]));

    h.client.send(ApiRequest::get(DEALS)).await.unwrap();

    let sent = h.transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], ApiRequest::get(DEALS));
}

#[tokio::test]
async fn fresh_token_is_attached_without_refresh() {
    let token = token_expiring_in(3600, "USER");
    let h = harness(Some(token.clone()));
    h.transport.push_status(200, &json!([]));

    h.client.send(ApiRequest::get(DEALS)).await.unwrap();

    assert_eq!(h.transport.paths(), vec![DEALS]);
    assert_eq!(h.transport.requests()[0].bearer, Some(token));
}

// =============================================================================
// Proactive refresh
// =============================================================================

#[tokio::test]
async fn expiring_token_refreshes_once_before_forwarding() {
    let old = token_expiring_in(100, "USER");
    let new = token_expiring_in(3600, "USER");
    let h = harness(Some(old.clone()));
    h.transport.push_token(&new);
    h.transport.push_status(200, &json!([]));

    h.client.send(ApiRequest::get(DEALS)).await.unwrap();

    assert_eq!(h.transport.paths(), vec![endpoints::REFRESH, DEALS]);
    let sent = h.transport.requests();
    assert_eq!(sent[0].bearer, Some(old));
    assert_eq!(sent[1].bearer, Some(new.clone()));
    assert_eq!(h.store.token(), Some(new));
}

#[tokio::test]
async fn failed_proactive_refresh_still_sends_stale_token() {
    let old = token_expiring_in(100, "USER");
    let h = harness(Some(old.clone()));
    h.transport.push_status(500, &json!({ "message": "boom" }));
    h.transport.push_status(200, &json!([]));

    h.client.send(ApiRequest::get(DEALS)).await.unwrap();

    assert_eq!(h.transport.paths(), vec![endpoints::REFRESH, DEALS]);
    assert_eq!(h.transport.requests()[1].bearer, Some(old));
    assert!(!h.store.has_token());
    assert_eq!(h.navigator.last(), Some(Route::Login));
}

#[tokio::test]
async fn undecodable_token_is_treated_as_expiring() {
    let h = harness(Some("opaque".into()));
    h.transport.push_token("renewed");
    h.transport.push_status(200, &json!([]));

    h.client.send(ApiRequest::get(DEALS)).await.unwrap();

    assert_eq!(h.transport.paths(), vec![endpoints::REFRESH, DEALS]);
    assert_eq!(h.transport.requests()[1].bearer.as_deref(), Some("renewed"));
}

// =============================================================================
// 401 recovery
// =============================================================================

#[tokio::test]
async fn unauthorized_then_refresh_retries_once_with_new_token() {
    let new = token_expiring_in(3600, "USER");
    let h = harness(Some(token_expiring_in(3600, "USER")));
    h.transport.push_status(401, &json!({ "message": "revoked" }));
    h.transport.push_token(&new);
    h.transport.push_status(200, &json!([{ "id": "d-1" }]));

    let resp = h.client.send(ApiRequest::get(DEALS)).await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(h.transport.paths(), vec![DEALS, endpoints::REFRESH, DEALS]);
    assert_eq!(h.transport.requests()[2].bearer, Some(new));
}

#[tokio::test]
async fn second_unauthorized_is_returned_without_another_refresh() {
    let h = harness(Some(token_expiring_in(3600, "USER")));
    h.transport.push_status(401, &json!({ "message": "revoked" }));
    h.transport.push_token(&token_expiring_in(3600, "USER"));
    h.transport.push_status(401, &json!({ "message": "still no" }));

    let err = h.client.send(ApiRequest::get(DEALS)).await.unwrap_err();

    assert_eq!(err, ApiError::AuthRejected { message: "still no".into() });
    assert_eq!(h.transport.paths(), vec![DEALS, endpoints::REFRESH, DEALS]);
}

#[tokio::test]
async fn failed_refresh_after_unauthorized_logs_out_and_returns_original() {
    let h = harness(Some(token_expiring_in(3600, "USER")));
    h.transport.push_status(401, &json!({ "message": "revoked" }));
    h.transport.push_status(401, &json!({ "message": "refresh denied" }));

    let err = h.client.send(ApiRequest::get(DEALS)).await.unwrap_err();

    assert_eq!(err, ApiError::AuthRejected { message: "revoked".into() });
    assert_eq!(h.transport.paths(), vec![DEALS, endpoints::REFRESH]);
    assert!(!h.store.has_token());
    assert_eq!(h.client.gateway().phase(), AuthPhase::Anonymous);
    assert_eq!(h.navigator.last(), Some(Route::Login));
}

#[tokio::test]
async fn unauthorized_without_token_is_returned_after_logout() {
    let h = harness(None);
    h.transport.push_status(401, &json!({ "message": "login first" }));

    let err = h.client.send(ApiRequest::get(DEALS)).await.unwrap_err();

    assert_eq!(err, ApiError::AuthRejected { message: "login first".into() });
    assert_eq!(h.transport.paths(), vec![DEALS]);
    assert_eq!(h.navigator.last(), Some(Route::Login));
}

#[tokio::test]
async fn forbidden_is_not_retried() {
    let h = harness(Some(token_expiring_in(3600, "USER")));
    h.transport.push_status(403, &json!({ "message": "admins only" }));

    let err = h.client.send(ApiRequest::get("/api/users")).await.unwrap_err();

    assert_eq!(err, ApiError::Forbidden { message: "admins only".into() });
    assert_eq!(h.transport.paths(), vec!["/api/users"]);
    assert!(h.store.has_token());
}

// =============================================================================
// Auth endpoints
// =============================================================================

#[tokio::test]
async fn auth_endpoints_get_token_but_never_refresh() {
    let old = token_expiring_in(10, "USER");
    let h = harness(Some(old.clone()));
    h.transport.push_status(401, &json!({ "message": "nope" }));

    let err = h.client.send(ApiRequest::post(endpoints::LOGOUT)).await.unwrap_err();

    assert!(matches!(err, ApiError::AuthRejected { .. }));
    assert_eq!(h.transport.paths(), vec![endpoints::LOGOUT]);
    assert_eq!(h.transport.requests()[0].bearer, Some(old.clone()));
    assert_eq!(h.store.token(), Some(old));
}

#[tokio::test]
async fn auth_endpoint_without_token_has_no_bearer() {
    let h = harness(None);
    h.transport.push_token("t");
    h.client.send(ApiRequest::post(endpoints::LOGIN)).await.unwrap();
    assert_eq!(h.transport.requests()[0].bearer, None);
}

// =============================================================================
// Errors and decoding
// =============================================================================

#[tokio::test]
async fn network_failure_propagates() {
    let h = harness(Some(token_expiring_in(3600, "USER")));
    h.transport.push(Err(ApiError::Network("connection refused".into())));

    let err = h.client.send(ApiRequest::get(DEALS)).await.unwrap_err();

    assert_eq!(err, ApiError::Network("connection refused".into()));
    assert!(h.store.has_token());
}

#[tokio::test]
async fn send_json_decodes_body() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    let h = harness(Some(token_expiring_in(3600, "USER")));
    h.transport.push_status(200, &json!([{ "id": "a" }, { "id": "b" }]));

    let items: Vec<Item> = h.client.send_json(ApiRequest::get(DEALS)).await.unwrap();

    assert_eq!(items, vec![Item { id: "a".into() }, Item { id: "b".into() }]);
}

#[tokio::test]
async fn send_json_reports_shape_mismatch() {
    let h = harness(None);
    h.transport.push_status(200, &json!({ "unexpected": true }));
    let err = h.client.send_json::<Vec<String>>(ApiRequest::get(DEALS)).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}
