// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch sync isolation tests against the Firestore emulator and a mock
//! Whoop server.
//!
//! Three connected users; the middle one's refresh token is dead. The
//! batch must report per-user results, count only successful users'
//! records, and keep going after the failure.

use chrono::{Duration, Utc};
use serde_json::json;
use vitalsync::db::Db;
use vitalsync::models::WhoopCredential;
use vitalsync::services::SyncService;
use vitalsync::time_utils::format_utc_rfc3339;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn credential(user_id: &str, access: &str, refresh: &str, minutes_left: i64) -> WhoopCredential {
    WhoopCredential {
        user_id: user_id.to_string(),
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: format_utc_rfc3339(Utc::now() + Duration::minutes(minutes_left)),
        whoop_user_id: None,
    }
}

fn empty_page() -> serde_json::Value {
    json!({ "records": [], "next_token": null })
}

#[tokio::test]
async fn test_batch_isolates_per_user_failures() {
    require_emulator!();
    // Dedicated project: list_credentials must see exactly these three users
    let db = Db::new("vitalsync-batch-test")
        .await
        .expect("Failed to connect to Firestore emulator");
    let mock_server = MockServer::start().await;

    db.set_credential(&credential("batch-user-1", "u1_access", "u1_refresh", 60))
        .await
        .unwrap();
    db.set_credential(&credential("batch-user-2", "u2_access", "u2_refresh", 2))
        .await
        .unwrap();
    db.set_credential(&credential("batch-user-3", "u3_access", "u3_refresh", 60))
        .await
        .unwrap();

    // User 2's refresh token is spent
    Mock::given(method("POST"))
        .and(path("/oauth/oauth2/token"))
        .and(body_string_contains("refresh_token=u2_refresh"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&mock_server)
        .await;

    // User 1 has one cycle in range; recovery/sleep empty
    Mock::given(method("GET"))
        .and(path("/v1/cycle"))
        .and(header("authorization", "Bearer u1_access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{
                "id": 100,
                "start": "2024-03-07T06:00:00Z",
                "end": "2024-03-08T06:00:00Z",
                "score": { "strain": 11.0 }
            }],
            "next_token": null
        })))
        .mount(&mock_server)
        .await;

    // Everything else is empty for everyone
    for endpoint in [
        "/v1/cycle",
        "/v1/recovery",
        "/v1/activity/sleep",
        "/v1/activity/workout",
    ] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
            .mount(&mock_server)
            .await;
    }

    let (whoop, _cache) = common::mock_whoop_service(&mock_server.uri(), db.clone());
    let sync = SyncService::new(whoop, db.clone());

    let report = sync.sync_all_users(7).await.expect("batch itself must run");

    assert_eq!(report.total_users, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    // Only user 1's single metrics row counts
    assert_eq!(report.total_records, 1);

    let by_user = |id: &str| {
        report
            .results
            .iter()
            .find(|r| r.user_id == id)
            .unwrap_or_else(|| panic!("missing result for {}", id))
    };

    assert!(by_user("batch-user-1").success);
    assert_eq!(by_user("batch-user-1").metrics_synced, 1);
    assert!(!by_user("batch-user-2").success);
    assert!(by_user("batch-user-2").error.is_some());
    assert!(by_user("batch-user-3").success);
    assert_eq!(by_user("batch-user-3").metrics_synced, 0);

    // The failed user's credential was deleted by the refresh gate
    let gone = db.get_credential("batch-user-2").await.unwrap();
    assert!(gone.is_none());
}
