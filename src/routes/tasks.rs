// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Scheduled trigger routes.
//!
//! These endpoints are called by the scheduler, not directly by users.
//! They are protected by the shared-secret middleware in routes/mod.rs.

use crate::error::Result;
use crate::services::sync::UserSyncResult;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default sync window for the scheduled batch run.
const DEFAULT_SYNC_DAYS: u32 = 7;

/// Trigger routes (called by the scheduler).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/sync-all", post(sync_all))
}

#[derive(Deserialize)]
struct SyncAllQuery {
    /// Override the sync window (days back from today)
    days: Option<u32>,
}

/// Batch sync summary returned to the scheduler.
#[derive(Serialize)]
pub struct SyncAllResponse {
    pub success: bool,
    pub total_users: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_records: usize,
    pub results: Vec<UserSyncResult>,
}

/// Sync every connected user's recent window.
///
/// Per-user failures are isolated and reported in `results`; the
/// endpoint itself only fails when the batch cannot run at all
/// (e.g. the credential list is unreadable).
async fn sync_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SyncAllQuery>,
) -> Result<Json<SyncAllResponse>> {
    let days = query.days.unwrap_or(DEFAULT_SYNC_DAYS).clamp(1, 90);

    tracing::info!(days, "Scheduled batch sync starting");

    let report = state.sync.sync_all_users(days).await?;

    Ok(Json(SyncAllResponse {
        success: true,
        total_users: report.total_users,
        succeeded: report.succeeded,
        failed: report.failed,
        total_records: report.total_records,
        results: report.results,
    }))
}
