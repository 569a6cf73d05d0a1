// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop API client tests against a mock server.
//!
//! Covers pagination, error surfacing and the empty-range short-circuit.
//! No Firestore required: the sync short-circuit test runs against the
//! offline mock DB, which would error on any write - proving none happens.

use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use vitalsync::models::whoop::Cycle;
use vitalsync::services::whoop::CachedToken;
use vitalsync::services::SyncService;
use wiremock::matchers::{body_string_contains, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
}

fn cycle_json(id: u64, start: &str) -> serde_json::Value {
    json!({
        "id": id,
        "start": start,
        "end": null,
        "score": { "strain": 10.0, "kilojoule": 7000.0 }
    })
}

#[tokio::test]
async fn test_pagination_follows_next_token_and_preserves_order() {
    let mock_server = MockServer::start().await;

    // Page 1: no nextToken in the request yet
    Mock::given(method("GET"))
        .and(path("/v1/cycle"))
        .and(query_param_is_missing("nextToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [cycle_json(1, "2024-03-01T06:00:00Z")],
            "next_token": "t1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Page 2
    Mock::given(method("GET"))
        .and(path("/v1/cycle"))
        .and(query_param("nextToken", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [cycle_json(2, "2024-03-02T06:00:00Z")],
            "next_token": "t2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Page 3: terminal (null next_token)
    Mock::given(method("GET"))
        .and(path("/v1/cycle"))
        .and(query_param("nextToken", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [cycle_json(3, "2024-03-03T06:00:00Z")],
            "next_token": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (whoop, _cache) = common::mock_whoop_service(&mock_server.uri(), common::test_db_offline());

    let cycles: Vec<Cycle> = whoop
        .client()
        .get_cycles("token", start_date(), end_date())
        .await
        .expect("pagination should succeed");

    // Exactly 3 requests (checked by expect(1) on each mock) and all
    // records concatenated in page order.
    let ids: Vec<u64> = cycles.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_date_range_bounds_cover_whole_days() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/cycle"))
        .and(query_param("start", "2024-03-01T00:00:00.000Z"))
        .and(query_param("end", "2024-03-07T23:59:59.999Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [],
            "next_token": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (whoop, _cache) = common::mock_whoop_service(&mock_server.uri(), common::test_db_offline());

    let cycles: Vec<Cycle> = whoop
        .client()
        .get_cycles("token", start_date(), end_date())
        .await
        .unwrap();

    assert!(cycles.is_empty());
}

#[tokio::test]
async fn test_non_2xx_aborts_with_endpoint_and_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/recovery"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let (whoop, _cache) = common::mock_whoop_service(&mock_server.uri(), common::test_db_offline());

    let err = whoop
        .client()
        .get_recoveries("token", start_date(), end_date())
        .await
        .expect_err("500 must abort the fetch");

    let message = err.to_string();
    assert!(
        message.contains("/v1/recovery") && message.contains("500"),
        "error should identify endpoint and status: {}",
        message
    );
}

#[tokio::test]
async fn test_refresh_token_posts_refresh_grant() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old_refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new_access",
            "refresh_token": "new_refresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (whoop, _cache) = common::mock_whoop_service(&mock_server.uri(), common::test_db_offline());

    let tokens = whoop
        .client()
        .refresh_token("old_refresh")
        .await
        .expect("refresh should succeed");

    assert_eq!(tokens.access_token, "new_access");
    assert_eq!(tokens.refresh_token, "new_refresh");
    assert_eq!(tokens.expires_in, 3600);
}

#[tokio::test]
async fn test_empty_cycle_range_short_circuits_without_writes() {
    let mock_server = MockServer::start().await;

    for endpoint in ["/v1/cycle", "/v1/recovery", "/v1/activity/sleep"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [],
                "next_token": null
            })))
            .mount(&mock_server)
            .await;
    }

    // Offline DB: any upsert attempt would error the sync. A cached valid
    // token keeps the token gate off the DB as well.
    let db = common::test_db_offline();
    let (whoop, cache) = common::mock_whoop_service(&mock_server.uri(), db.clone());
    cache.insert(
        "user-1".to_string(),
        CachedToken::new("token".to_string(), Utc::now() + Duration::hours(1)),
    );

    let sync = SyncService::new(whoop, db);

    let synced = sync
        .sync_user_metrics("user-1", start_date(), end_date())
        .await
        .expect("empty range must not touch storage");

    assert_eq!(synced, 0);
}
