//! HTTP collaborator clients against mock servers

use std::time::Duration;

use rust_decimal::Decimal;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clipfund::acquirer::{HttpMetricsApi, MetricsApi};
use clipfund::admin::{AuthorizationClient, HttpAuthorizationClient};
use clipfund::payout::{HttpPaymentClient, PaymentClient, PayoutError};
use clipfund::utils::error::AcquireError;

const TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Metrics API
// ============================================================================

#[tokio::test]
async fn test_metrics_api_query_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/video/query/"))
        .and(body_partial_json(serde_json::json!({
            "filters": { "video_ids": ["731"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "videos": [{
                    "view_count": 822000,
                    "like_count": 3100,
                    "comment_count": 57,
                    "share_count": 12
                }]
            }
        })))
        .mount(&server)
        .await;

    let api = HttpMetricsApi::new(&server.uri(), TIMEOUT).unwrap();
    let metrics = api.query_video_metrics("731", "token-1").await.unwrap();

    assert_eq!(metrics.view_count, 822_000);
    assert_eq!(metrics.like_count, 3_100);
}

#[tokio::test]
async fn test_metrics_api_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/video/query/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let api = HttpMetricsApi::new(&server.uri(), TIMEOUT).unwrap();
    let result = api.query_video_metrics("731", "expired").await;

    assert!(matches!(result, Err(AcquireError::ApiStatus(401))));
}

#[tokio::test]
async fn test_metrics_api_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/video/query/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"data": {"videos": []}})),
        )
        .mount(&server)
        .await;

    let api = HttpMetricsApi::new(&server.uri(), TIMEOUT).unwrap();
    let result = api.query_video_metrics("731", "token-1").await;

    assert!(matches!(result, Err(AcquireError::ApiResponse(_))));
}

// ============================================================================
// Payment Client
// ============================================================================

#[tokio::test]
async fn test_payment_initiate_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payouts"))
        .and(body_partial_json(serde_json::json!({
            "clipper_id": "clipper-1",
            "submission_id": "sub-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "transfer_id": "tr_42"
        })))
        .mount(&server)
        .await;

    let client = HttpPaymentClient::new(&server.uri(), TIMEOUT).unwrap();
    let amount: Decimal = "1.20".parse().unwrap();
    let receipt = client
        .initiate_payout("clipper-1", amount, "sub-1")
        .await
        .unwrap();

    assert_eq!(receipt.transfer_id, "tr_42");
}

#[tokio::test]
async fn test_payment_rejection_carries_reason() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payouts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error": "insufficient campaign budget"
        })))
        .mount(&server)
        .await;

    let client = HttpPaymentClient::new(&server.uri(), TIMEOUT).unwrap();
    let amount: Decimal = "1.20".parse().unwrap();
    let result = client.initiate_payout("clipper-1", amount, "sub-1").await;

    match result {
        Err(PayoutError::Rejected(reason)) => {
            assert!(reason.contains("insufficient campaign budget"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_payment_service_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payouts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpPaymentClient::new(&server.uri(), TIMEOUT).unwrap();
    let amount: Decimal = "1.20".parse().unwrap();
    let result = client.initiate_payout("clipper-1", amount, "sub-1").await;

    assert!(matches!(result, Err(PayoutError::ServiceStatus(503))));
}

#[tokio::test]
async fn test_payout_destination_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clippers/clipper-1/payout-destination"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"has_destination": true})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/clippers/clipper-2/payout-destination"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpPaymentClient::new(&server.uri(), TIMEOUT).unwrap();
    assert!(client.has_payout_destination("clipper-1").await.unwrap());
    assert!(!client.has_payout_destination("clipper-2").await.unwrap());
}

// ============================================================================
// Authorization Client
// ============================================================================

#[tokio::test]
async fn test_is_admin_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/admin-1/role"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"is_admin": true})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/user-1/role"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"is_admin": false})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/ghost/role"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpAuthorizationClient::new(&server.uri(), TIMEOUT).unwrap();
    assert!(client.is_admin("admin-1").await.unwrap());
    assert!(!client.is_admin("user-1").await.unwrap());
    assert!(!client.is_admin("ghost").await.unwrap());
}

#[tokio::test]
async fn test_access_token_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clippers/clipper-1/platform-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "tok-99"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/clippers/clipper-2/platform-token"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpAuthorizationClient::new(&server.uri(), TIMEOUT).unwrap();
    assert_eq!(
        client.access_token_for("clipper-1").await.unwrap().as_deref(),
        Some("tok-99")
    );
    assert!(client.access_token_for("clipper-2").await.unwrap().is_none());
}
