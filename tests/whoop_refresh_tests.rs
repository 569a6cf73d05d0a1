// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token refresh gate tests against the Firestore emulator and a mock
//! Whoop server.
//!
//! Run with FIRESTORE_EMULATOR_HOST set; each test uses its own user ID
//! inside a dedicated emulator project to stay isolated.

use chrono::{Duration, Utc};
use serde_json::json;
use vitalsync::db::Db;
use vitalsync::models::WhoopCredential;
use vitalsync::time_utils::format_utc_rfc3339;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

async fn refresh_test_db() -> Db {
    Db::new("vitalsync-refresh-test")
        .await
        .expect("Failed to connect to Firestore emulator")
}

fn credential(user_id: &str, refresh_token: &str, expires_in_minutes: i64) -> WhoopCredential {
    WhoopCredential {
        user_id: user_id.to_string(),
        access_token: "stored_access".to_string(),
        refresh_token: refresh_token.to_string(),
        expires_at: format_utc_rfc3339(Utc::now() + Duration::minutes(expires_in_minutes)),
        whoop_user_id: Some(42),
    }
}

#[tokio::test]
async fn test_valid_credential_returned_without_refresh() {
    require_emulator!();
    let db = refresh_test_db().await;
    let mock_server = MockServer::start().await;

    // Any hit on the token endpoint fails the test
    Mock::given(method("POST"))
        .and(path("/oauth/oauth2/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let user_id = "refresh-user-valid";
    // 60 minutes left: well outside the 5-minute margin
    db.set_credential(&credential(user_id, "refresh", 60))
        .await
        .unwrap();

    let (whoop, _cache) = common::mock_whoop_service(&mock_server.uri(), db.clone());

    let token = whoop.get_valid_access_token(user_id).await.unwrap();

    assert_eq!(token.as_deref(), Some("stored_access"));
}

#[tokio::test]
async fn test_expiring_credential_is_refreshed_and_rotated() {
    require_emulator!();
    let db = refresh_test_db().await;
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "rotated_access",
            "refresh_token": "rotated_refresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let user_id = "refresh-user-rotate";
    // 2 minutes left: inside the 5-minute margin, must refresh
    db.set_credential(&credential(user_id, "old_refresh", 2))
        .await
        .unwrap();

    let (whoop, _cache) = common::mock_whoop_service(&mock_server.uri(), db.clone());

    let token = whoop.get_valid_access_token(user_id).await.unwrap();
    assert_eq!(token.as_deref(), Some("rotated_access"));

    // Rotated pair persisted, external user id preserved
    let stored = db.get_credential(user_id).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "rotated_access");
    assert_eq!(stored.refresh_token, "rotated_refresh");
    assert_eq!(stored.whoop_user_id, Some(42));
}

#[tokio::test]
async fn test_failed_refresh_deletes_credential() {
    require_emulator!();
    let db = refresh_test_db().await;
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&mock_server)
        .await;

    let user_id = "refresh-user-dead";
    db.set_credential(&credential(user_id, "spent_refresh", 2))
        .await
        .unwrap();

    let (whoop, _cache) = common::mock_whoop_service(&mock_server.uri(), db.clone());

    // Gate reports "not connected"...
    let token = whoop.get_valid_access_token(user_id).await.unwrap();
    assert_eq!(token, None);

    // ...and the credential is gone, forcing re-authorization
    let stored = db.get_credential(user_id).await.unwrap();
    assert!(stored.is_none(), "credential must be deleted after failed refresh");
}

#[tokio::test]
async fn test_missing_credential_returns_none() {
    require_emulator!();
    let db = refresh_test_db().await;
    let mock_server = MockServer::start().await;

    let (whoop, _cache) = common::mock_whoop_service(&mock_server.uri(), db);

    let token = whoop
        .get_valid_access_token("refresh-user-never-connected")
        .await
        .unwrap();

    assert_eq!(token, None);
}
