// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop sync orchestration.
//!
//! Handles the core workflow:
//! 1. Obtain a valid access token (refresh gate)
//! 2. Fetch cycles, recovery and sleep for the range in parallel
//! 3. Join recovery/sleep to their parent cycle and flatten per UTC date
//! 4. Batch-upsert the rows keyed on (user_id, date)
//!
//! Workout sync is the same shape with a single fetch. The batch variant
//! walks every connected user and isolates failures per user.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::db::Db;
use crate::error::AppError;
use crate::models::whoop::{Cycle, Recovery, Sleep, StageSummary, Workout};
use crate::models::{CachedWorkout, DailyMetricsRow};
use crate::services::WhoopService;
use crate::time_utils::{format_utc_rfc3339, utc_date_of};

/// Whoop sync orchestrator for one or all users.
#[derive(Clone)]
pub struct SyncService {
    whoop: WhoopService,
    db: Db,
}

/// Per-user sync counts.
#[derive(Debug, Clone, Serialize)]
pub struct UserSyncReport {
    pub metrics_synced: usize,
    pub workouts_synced: usize,
}

/// One user's entry in a batch sync result.
#[derive(Debug, Clone, Serialize)]
pub struct UserSyncResult {
    pub user_id: String,
    pub success: bool,
    pub metrics_synced: usize,
    pub workouts_synced: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of a batch sync over all connected users.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSyncReport {
    pub total_users: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_records: usize,
    pub results: Vec<UserSyncResult>,
}

impl SyncService {
    pub fn new(whoop: WhoopService, db: Db) -> Self {
        Self { whoop, db }
    }

    /// Sync cycles/recovery/sleep for a date range into per-day metric rows.
    ///
    /// Returns the number of rows upserted. Zero cycles short-circuits
    /// without touching storage.
    pub async fn sync_user_metrics(
        &self,
        user_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<usize, AppError> {
        let access_token = self
            .whoop
            .get_valid_access_token(user_id)
            .await?
            .ok_or(AppError::NotConnected)?;

        let client = self.whoop.client();

        // Three independent fetches; if any fails the sync fails whole,
        // never committing a cycles-only partial view.
        let (cycles, recoveries, sleeps) = tokio::try_join!(
            client.get_cycles(&access_token, start_date, end_date),
            client.get_recoveries(&access_token, start_date, end_date),
            client.get_sleeps(&access_token, start_date, end_date),
        )?;

        if cycles.is_empty() {
            tracing::info!(user_id, "No cycles in range, nothing to sync");
            return Ok(0);
        }

        let synced_at = format_utc_rfc3339(Utc::now());
        let rows = build_daily_rows(user_id, &cycles, &recoveries, &sleeps, &synced_at);

        if rows.is_empty() {
            return Ok(0);
        }

        self.db.batch_upsert_daily_metrics(&rows).await?;

        tracing::info!(
            user_id,
            cycles = cycles.len(),
            rows = rows.len(),
            "Synced daily metrics"
        );

        Ok(rows.len())
    }

    /// Sync workouts for a date range into the cached workout table.
    ///
    /// Idempotent: rows key on the remote workout ID, so overlapping
    /// ranges never duplicate.
    pub async fn sync_user_workouts(
        &self,
        user_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<usize, AppError> {
        let access_token = self
            .whoop
            .get_valid_access_token(user_id)
            .await?
            .ok_or(AppError::NotConnected)?;

        let workouts = self
            .whoop
            .client()
            .get_workouts(&access_token, start_date, end_date)
            .await?;

        if workouts.is_empty() {
            return Ok(0);
        }

        let synced_at = format_utc_rfc3339(Utc::now());
        let rows = build_workout_rows(user_id, &workouts, &synced_at);

        self.db.batch_upsert_workouts(&rows).await?;

        tracing::info!(user_id, workouts = rows.len(), "Synced workouts");

        Ok(rows.len())
    }

    /// Sync the most recent `days` days of metrics and workouts for a user.
    pub async fn sync_user(&self, user_id: &str, days: u32) -> Result<UserSyncReport, AppError> {
        let end_date = Utc::now().date_naive();
        let start_date = end_date - chrono::Duration::days(days as i64);

        let metrics_synced = self.sync_user_metrics(user_id, start_date, end_date).await?;
        let workouts_synced = self
            .sync_user_workouts(user_id, start_date, end_date)
            .await?;

        Ok(UserSyncReport {
            metrics_synced,
            workouts_synced,
        })
    }

    /// Sync every connected user, isolating failures per user.
    ///
    /// One user's failure (expired refresh token, API error) must not
    /// abort the rest of the batch; it is recorded in that user's result
    /// entry instead.
    pub async fn sync_all_users(&self, days: u32) -> Result<BatchSyncReport, AppError> {
        let credentials = self.db.list_credentials().await?;

        let total_users = credentials.len();
        let mut results = Vec::with_capacity(total_users);
        let mut succeeded = 0;
        let mut failed = 0;
        let mut total_records = 0;

        for credential in credentials {
            let user_id = credential.user_id;
            match self.sync_user(&user_id, days).await {
                Ok(report) => {
                    succeeded += 1;
                    total_records += report.metrics_synced + report.workouts_synced;
                    results.push(UserSyncResult {
                        user_id,
                        success: true,
                        metrics_synced: report.metrics_synced,
                        workouts_synced: report.workouts_synced,
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!(user_id = %user_id, error = %err, "User sync failed, continuing batch");
                    failed += 1;
                    results.push(UserSyncResult {
                        user_id,
                        success: false,
                        metrics_synced: 0,
                        workouts_synced: 0,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        tracing::info!(
            total_users,
            succeeded,
            failed,
            total_records,
            "Batch sync complete"
        );

        Ok(BatchSyncReport {
            total_users,
            succeeded,
            failed,
            total_records,
            results,
        })
    }
}

// ─── Row Building ────────────────────────────────────────────────────────

/// Join recovery and sleep records to their cycles and flatten into one row
/// per UTC calendar date.
///
/// Cycles without a `start` are skipped; sleep records without a `cycle_id`
/// are unmatchable and skipped. When two cycles land on the same calendar
/// date (possible around midnight), the later cycle in iteration order
/// wins and replaces the earlier row.
fn build_daily_rows(
    user_id: &str,
    cycles: &[Cycle],
    recoveries: &[Recovery],
    sleeps: &[Sleep],
    synced_at: &str,
) -> Vec<DailyMetricsRow> {
    let recovery_by_cycle: HashMap<u64, &Recovery> =
        recoveries.iter().map(|r| (r.cycle_id, r)).collect();
    let sleep_by_cycle: HashMap<u64, &Sleep> = sleeps
        .iter()
        .filter_map(|s| s.cycle_id.map(|cycle_id| (cycle_id, s)))
        .collect();

    let mut rows: BTreeMap<NaiveDate, DailyMetricsRow> = BTreeMap::new();

    for cycle in cycles {
        let Some(start) = cycle.start.as_deref() else {
            continue;
        };
        let Some(date) = utc_date_of(start) else {
            continue;
        };

        let recovery = recovery_by_cycle.get(&cycle.id).copied();
        let sleep = sleep_by_cycle.get(&cycle.id).copied();

        rows.insert(date, build_row(user_id, date, cycle, recovery, sleep, synced_at));
    }

    rows.into_values().collect()
}

/// Flatten one cycle with its (optional) matched recovery and sleep.
fn build_row(
    user_id: &str,
    date: NaiveDate,
    cycle: &Cycle,
    recovery: Option<&Recovery>,
    sleep: Option<&Sleep>,
    synced_at: &str,
) -> DailyMetricsRow {
    let cycle_score = cycle.score.as_ref();
    let recovery_score = recovery.and_then(|r| r.score.as_ref());
    let sleep_score = sleep.and_then(|s| s.score.as_ref());

    DailyMetricsRow {
        user_id: user_id.to_string(),
        date,
        cycle_id: cycle.id,

        strain: cycle_score.and_then(|s| s.strain),
        kilojoule: cycle_score.and_then(|s| s.kilojoule),
        average_heart_rate: cycle_score.and_then(|s| s.average_heart_rate),
        max_heart_rate: cycle_score.and_then(|s| s.max_heart_rate),

        recovery_score: recovery_score.and_then(|s| s.recovery_score),
        hrv_rmssd_milli: recovery_score.and_then(|s| s.hrv_rmssd_milli),
        resting_heart_rate: recovery_score.and_then(|s| s.resting_heart_rate),
        spo2_percentage: recovery_score.and_then(|s| s.spo2_percentage),
        skin_temp_celsius: recovery_score.and_then(|s| s.skin_temp_celsius),

        sleep_id: sleep.map(|s| s.id),
        sleep_performance_percentage: sleep_score
            .and_then(|s| s.sleep_performance_percentage),
        sleep_duration_minutes: sleep_score
            .and_then(|s| s.stage_summary.as_ref())
            .map(sleep_duration_minutes),
        sleep_score: sleep_score
            .and_then(|s| s.sleep_performance_percentage)
            .map(|p| p.round() as i64),

        raw: serde_json::json!({
            "cycle": cycle,
            "recovery": recovery,
            "sleep": sleep,
        }),
        synced_at: synced_at.to_string(),
    }
}

/// Actual sleep time in minutes: light + slow-wave + REM.
///
/// Awake and no-data time in the same payload is excluded.
fn sleep_duration_minutes(stages: &StageSummary) -> i64 {
    let total_milli = stages.total_light_sleep_time_milli.unwrap_or(0)
        + stages.total_slow_wave_sleep_time_milli.unwrap_or(0)
        + stages.total_rem_sleep_time_milli.unwrap_or(0);
    (total_milli as f64 / 60_000.0).round() as i64
}

/// Map remote workouts to cached rows keyed on the remote workout ID.
fn build_workout_rows(
    user_id: &str,
    workouts: &[Workout],
    synced_at: &str,
) -> Vec<CachedWorkout> {
    workouts
        .iter()
        .map(|workout| {
            let score = workout.score.as_ref();
            CachedWorkout {
                user_id: user_id.to_string(),
                workout_id: workout.id,
                sport_id: workout.sport_id,
                start: workout.start.clone(),
                end: workout.end.clone(),
                strain: score.and_then(|s| s.strain),
                average_heart_rate: score.and_then(|s| s.average_heart_rate),
                max_heart_rate: score.and_then(|s| s.max_heart_rate),
                kilojoule: score.and_then(|s| s.kilojoule),
                distance_meter: score.and_then(|s| s.distance_meter),
                raw: serde_json::json!(workout),
                synced_at: synced_at.to_string(),
            }
        })
        .collect()
}
