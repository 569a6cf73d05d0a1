// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::Arc;
use vitalsync::config::Config;
use vitalsync::db::Db;
use vitalsync::routes::create_router;
use vitalsync::services::{AggregationService, SyncService, WhoopClient, WhoopService};
use vitalsync::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> Db {
    Db::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> Db {
    Db::new_mock()
}

/// Create a WhoopService pointing at a mock server, with fresh caches.
///
/// Returns the service together with its token cache so tests can seed
/// or inspect cached tokens directly.
#[allow(dead_code)]
pub fn mock_whoop_service(
    mock_server_uri: &str,
    db: Db,
) -> (WhoopService, vitalsync::services::TokenCache) {
    let client = WhoopClient::new_with_base_url(
        mock_server_uri,
        &format!("{}/oauth/oauth2/token", mock_server_uri),
        "client_id".to_string(),
        "client_secret".to_string(),
    );

    let token_cache = Arc::new(dashmap::DashMap::new());
    let refresh_locks = Arc::new(dashmap::DashMap::new());

    let service = WhoopService::with_client(client, db, token_cache.clone(), refresh_locks);
    (service, token_cache)
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let token_cache = Arc::new(dashmap::DashMap::new());
    let refresh_locks = Arc::new(dashmap::DashMap::new());

    let whoop = WhoopService::new(
        config.whoop_client_id.clone(),
        config.whoop_client_secret.clone(),
        db.clone(),
        token_cache,
        refresh_locks,
    );

    let sync = SyncService::new(whoop.clone(), db.clone());
    let aggregator = AggregationService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        whoop,
        sync,
        aggregator,
    });

    (create_router(state.clone()), state)
}
