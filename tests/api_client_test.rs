//! HTTP client tests against an in-process mock of the XP service

mod common;

use std::sync::Arc;

use ancient_monad::api::{ApiError, HttpXpService, XpApiClient, XpService};
use ancient_monad::ledger::MemoryStore;
use ancient_monad::retry::Transient;
use ancient_monad::tracker::{ClaimOutcome, XpTracker};

use common::{MockServer, INSTANT_RETRY, WALLET};

#[test]
fn test_fetch_xp_request_and_parse() {
    let server = MockServer::start(vec![(
        200,
        r#"{"success": true, "data": {"xp_total": "250", "claim_count": 2, "last_claimed_at": "2025-03-01T10:00:00.000Z", "canClaim": false, "nextClaimTime": "2025-03-02T10:00:00.000Z"}}"#,
    )]);
    let client = XpApiClient::with_url(&server.base_url);

    let record = client.fetch_xp(WALLET).unwrap();
    assert_eq!(record.xp_total, 250);
    assert_eq!(record.claim_count, 2);
    assert_eq!(record.can_claim, Some(false));
    assert!(record.next_claim_time.is_some());
    assert!(!record.is_fallback());

    let requests = server.finish();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, format!("/api/xp?walletAddress={}", WALLET));
}

#[test]
fn test_claim_posts_wallet() {
    let server = MockServer::start(vec![(
        200,
        r#"{"success": true, "data": {"xp_total": 10, "claim_count": 1, "canClaim": false}}"#,
    )]);
    let client = XpApiClient::with_url(&server.base_url);

    let record = client.claim_daily(WALLET).unwrap();
    assert_eq!(record.xp_total, 10);

    let requests = server.finish();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/api/xp");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, serde_json::json!({ "walletAddress": WALLET }));
}

#[test]
fn test_claim_cooldown_response() {
    let server = MockServer::start(vec![(
        400,
        r#"{"success": false, "error": "Cannot claim yet", "nextClaimTime": "2025-03-02T10:00:00.000Z", "data": {"xp_total": 10, "claim_count": 1, "canClaim": false}}"#,
    )]);
    let client = XpApiClient::with_url(&server.base_url);

    let err = client.claim_daily(WALLET).unwrap_err();
    match &err {
        ApiError::ClaimNotReady { next_claim_time } => {
            assert_eq!(
                next_claim_time.unwrap().to_rfc3339(),
                "2025-03-02T10:00:00+00:00"
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_transient());
    server.finish();
}

#[test]
fn test_error_classification() {
    let server = MockServer::start(vec![
        (500, r#"{"success": false, "error": "Failed to fetch XP data"}"#),
        (400, r#"{"success": false, "error": "Wallet address is required"}"#),
        (200, "not json"),
        (200, r#"{"success": false, "error": "Failed to create referral"}"#),
    ]);
    let client = XpApiClient::with_url(&server.base_url);

    let err = client.fetch_xp(WALLET).unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 500, .. }));
    assert!(err.is_transient());

    let err = client.fetch_xp("").unwrap_err();
    match &err {
        ApiError::Rejected { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Wallet address is required");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_transient());

    let err = client.fetch_xp(WALLET).unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)));
    assert!(err.is_transient());

    let err = client.create_referral(WALLET, None).unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 200, .. }));

    server.finish();
}

#[test]
fn test_referral_endpoints() {
    let server = MockServer::start(vec![
        (
            200,
            r#"{"success": true, "data": {"referral_code": "AB12C", "referrer_code": null, "twitter_connected": false, "xp": 15}}"#,
        ),
        (200, r#"{"success": true, "data": {"referralCode": "AB12C"}}"#),
    ]);
    let client = XpApiClient::with_url(&server.base_url);

    let referral = client.fetch_referral(WALLET).unwrap();
    assert_eq!(referral.referral_code.as_deref(), Some("AB12C"));
    assert_eq!(referral.xp, 15);

    let code = client.create_referral(WALLET, Some("ZZ99Z")).unwrap();
    assert_eq!(code, "AB12C");

    let requests = server.finish();
    assert_eq!(requests[0].url, format!("/api/referral?userWallet={}", WALLET));
    assert_eq!(requests[1].method, "POST");
    let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "userWallet": WALLET, "referrerCode": "ZZ99Z" })
    );
}

#[tokio::test]
async fn test_http_service_twitter_connect() {
    let server = MockServer::start(vec![(
        200,
        r#"{"success": true, "data": {"twitterConnected": true, "referralInfo": {"referral_code": "AB12C"}, "note": "Using fallback data"}}"#,
    )]);
    let service = HttpXpService::new(XpApiClient::with_url(&server.base_url));

    let connection = service.connect_twitter(WALLET, "oauth-token").await.unwrap();
    assert!(connection.twitter_connected);
    assert!(connection.referral_info.is_some());
    assert!(connection.is_fallback());

    let requests = server.finish();
    assert_eq!(requests[0].url, "/api/twitter/connect");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "userWallet": WALLET, "twitterToken": "oauth-token" })
    );
}

#[tokio::test]
async fn test_tracker_over_http_claim_blocked() {
    let server = MockServer::start(vec![
        (
            200,
            r#"{"success": true, "data": {"xp_total": 250, "claim_count": 2, "canClaim": false, "nextClaimTime": "2099-01-01T00:00:00.000Z"}}"#,
        ),
        (404, r#"{"success": false, "error": "Referral not found"}"#),
        (
            400,
            r#"{"success": false, "error": "Cannot claim yet", "nextClaimTime": "2099-01-01T00:00:00.000Z"}"#,
        ),
    ]);
    let service = HttpXpService::new(XpApiClient::with_url(&server.base_url));
    let tracker = XpTracker::new(Arc::new(service), Arc::new(MemoryStore::new()))
        .with_retry_policy(INSTANT_RETRY);

    tracker.connect_wallet(WALLET).await.unwrap();
    let data = tracker.snapshot();
    assert_eq!(data.level, 3);
    assert_eq!(data.progress, 50);
    assert_eq!(data.total_xp, 250);
    assert!(!data.can_claim);

    let outcome = tracker.claim_daily_reward().await.unwrap();
    assert!(matches!(outcome, ClaimOutcome::Blocked { next_claim_time: Some(_) }));
    assert_eq!(tracker.snapshot().claim_count, 2);

    assert_eq!(server.finish().len(), 3);
}

#[tokio::test]
async fn test_tracker_survives_out_of_range_xp() {
    let server = MockServer::start(vec![
        (200, r#"{"success": true, "data": {"xp_total": 1e30, "claim_count": 1}}"#),
        (200, r#"{"success": true, "data": {"referral_code": null, "xp": 1e30}}"#),
    ]);
    let service = HttpXpService::new(XpApiClient::with_url(&server.base_url));
    let tracker = XpTracker::new(Arc::new(service), Arc::new(MemoryStore::new()))
        .with_retry_policy(INSTANT_RETRY);

    tracker.connect_wallet(WALLET).await.unwrap();
    let data = tracker.snapshot();
    assert_eq!(data.xp_total, u64::MAX);
    assert_eq!(data.total_xp, u64::MAX);
    assert_eq!(data.level, 1 + u64::MAX / 100);
    assert_eq!(data.progress, 15);

    assert_eq!(server.finish().len(), 2);
}
