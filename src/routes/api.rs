// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::DailySummary;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/whoop/sync", post(sync_whoop))
        .route("/api/whoop/status", get(whoop_status))
        .route("/api/whoop/connection", delete(disconnect_whoop))
        .route("/api/summary/{date}", get(get_summary).post(refresh_summary))
}

// ─── Whoop Sync ──────────────────────────────────────────────

/// Request body for an on-demand sync of the user's recent window.
#[derive(Deserialize, Validate)]
pub struct SyncRequest {
    /// How many days back to sync (1-90)
    #[validate(range(min = 1, max = 90))]
    pub days: u32,
}

/// Result of an on-demand sync.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncResponse {
    pub success: bool,
    pub metrics_synced: usize,
    pub workouts_synced: usize,
}

/// Sync the authenticated user's recent Whoop data on demand.
async fn sync_whoop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SyncRequest>,
) -> Result<Json<SyncResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid sync request: {}", e)))?;

    let report = state.sync.sync_user(&user.user_id, payload.days).await?;

    Ok(Json(SyncResponse {
        success: true,
        metrics_synced: report.metrics_synced,
        workouts_synced: report.workouts_synced,
    }))
}

// ─── Whoop Connection ────────────────────────────────────────

/// Connection state for the settings page.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WhoopStatusResponse {
    pub connected: bool,
}

/// Whether the user currently has a Whoop credential stored.
async fn whoop_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WhoopStatusResponse>> {
    let connected = state.whoop.is_connected(&user.user_id).await?;
    Ok(Json(WhoopStatusResponse { connected }))
}

/// Disconnect Whoop: delete the stored credential.
async fn disconnect_whoop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WhoopStatusResponse>> {
    state.whoop.disconnect(&user.user_id).await?;
    Ok(Json(WhoopStatusResponse { connected: false }))
}

// ─── Daily Summary ───────────────────────────────────────────

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date: expected YYYY-MM-DD".to_string()))
}

/// Aggregate the day's summary and return it without persisting.
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Json<DailySummary>> {
    let date = parse_date(&date)?;
    let summary = state.aggregator.aggregate(&user.user_id, date).await?;
    Ok(Json(summary))
}

/// Rebuild and persist the day's summary document.
async fn refresh_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Json<DailySummary>> {
    let date = parse_date(&date)?;
    let summary = state.aggregator.sync_summary(&user.user_id, date).await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(
            parse_date("2024-03-07").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("03/07/2024").is_err());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_sync_request_day_bounds() {
        assert!(SyncRequest { days: 0 }.validate().is_err());
        assert!(SyncRequest { days: 1 }.validate().is_ok());
        assert!(SyncRequest { days: 90 }.validate().is_ok());
        assert!(SyncRequest { days: 91 }.validate().is_err());
    }
}
