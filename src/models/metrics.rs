// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted wearable rows derived from Whoop API payloads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Flattened per-day wearable metrics, one row per user and UTC calendar date.
///
/// Upserted keyed on `(user_id, date)`: re-syncing a date overwrites the row,
/// never appends. `raw` keeps the original nested payloads so fields can be
/// re-derived later without another API fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMetricsRow {
    pub user_id: String,
    /// UTC calendar date the cycle started on
    pub date: NaiveDate,
    /// Whoop cycle ID this row was built from
    pub cycle_id: u64,

    // Cycle score
    pub strain: Option<f64>,
    pub kilojoule: Option<f64>,
    pub average_heart_rate: Option<i64>,
    pub max_heart_rate: Option<i64>,

    // Recovery score (all None when no recovery matched the cycle)
    pub recovery_score: Option<f64>,
    pub hrv_rmssd_milli: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub spo2_percentage: Option<f64>,
    pub skin_temp_celsius: Option<f64>,

    // Sleep (all None when no sleep matched the cycle)
    pub sleep_id: Option<u64>,
    pub sleep_performance_percentage: Option<f64>,
    /// Light + slow-wave + REM time, in minutes (awake/no-data excluded)
    pub sleep_duration_minutes: Option<i64>,
    /// Rounded sleep performance percentage
    pub sleep_score: Option<i64>,

    /// Original nested API payloads (`{cycle, recovery, sleep}`)
    pub raw: serde_json::Value,
    /// When this row was written (ISO 8601)
    pub synced_at: String,
}

impl DailyMetricsRow {
    /// Document ID encoding the `(user_id, date)` upsert key.
    pub fn doc_id(&self) -> String {
        format!("{}_{}", self.user_id, self.date.format("%Y-%m-%d"))
    }
}

/// Cached remote workout, one row per user and Whoop workout ID.
///
/// Safe to re-sync with overlapping date ranges: the upsert key is the
/// remote ID, so duplicates collapse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedWorkout {
    pub user_id: String,
    /// Whoop workout ID (also part of the document ID)
    pub workout_id: u64,
    pub sport_id: Option<i64>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub strain: Option<f64>,
    pub average_heart_rate: Option<i64>,
    pub max_heart_rate: Option<i64>,
    pub kilojoule: Option<f64>,
    pub distance_meter: Option<f64>,
    /// Original API payload
    pub raw: serde_json::Value,
    /// When this row was written (ISO 8601)
    pub synced_at: String,
}

impl CachedWorkout {
    /// Document ID encoding the `(user_id, workout_id)` upsert key.
    pub fn doc_id(&self) -> String {
        format!("{}_{}", self.user_id, self.workout_id)
    }
}
