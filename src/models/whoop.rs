// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire types for the Whoop v1 developer API.
//!
//! Score payloads are nested and almost everything inside them is optional:
//! an in-progress cycle has no `end`, a pending score is absent entirely,
//! and individual metrics can be missing even when the score is present.
//! Missing data is represented as `None`, never treated as an error.

use serde::{Deserialize, Serialize};

/// One page of a paginated collection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Physiological cycle (the anchor entity: recovery and sleep reference it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    pub id: u64,
    /// Cycle start (RFC3339). Absent on malformed records, which are skipped.
    #[serde(default)]
    pub start: Option<String>,
    /// Cycle end; None while the cycle is still in progress.
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub score: Option<CycleScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleScore {
    #[serde(default)]
    pub strain: Option<f64>,
    #[serde(default)]
    pub kilojoule: Option<f64>,
    #[serde(default)]
    pub average_heart_rate: Option<i64>,
    #[serde(default)]
    pub max_heart_rate: Option<i64>,
}

/// Recovery record, keyed by its parent cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recovery {
    pub cycle_id: u64,
    #[serde(default)]
    pub sleep_id: Option<u64>,
    #[serde(default)]
    pub score: Option<RecoveryScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryScore {
    #[serde(default)]
    pub recovery_score: Option<f64>,
    #[serde(default)]
    pub hrv_rmssd_milli: Option<f64>,
    #[serde(default)]
    pub resting_heart_rate: Option<f64>,
    #[serde(default)]
    pub spo2_percentage: Option<f64>,
    #[serde(default)]
    pub skin_temp_celsius: Option<f64>,
}

/// Sleep activity. Records without a `cycle_id` cannot be matched to a day
/// and are skipped during sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sleep {
    pub id: u64,
    #[serde(default)]
    pub cycle_id: Option<u64>,
    #[serde(default)]
    pub score: Option<SleepScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepScore {
    #[serde(default)]
    pub stage_summary: Option<StageSummary>,
    #[serde(default)]
    pub sleep_performance_percentage: Option<f64>,
}

/// Per-stage sleep durations in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSummary {
    #[serde(default)]
    pub total_awake_time_milli: Option<i64>,
    #[serde(default)]
    pub total_no_data_time_milli: Option<i64>,
    #[serde(default)]
    pub total_light_sleep_time_milli: Option<i64>,
    #[serde(default)]
    pub total_slow_wave_sleep_time_milli: Option<i64>,
    #[serde(default)]
    pub total_rem_sleep_time_milli: Option<i64>,
}

/// Workout activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: u64,
    #[serde(default)]
    pub sport_id: Option<i64>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub score: Option<WorkoutScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutScore {
    #[serde(default)]
    pub strain: Option<f64>,
    #[serde(default)]
    pub average_heart_rate: Option<i64>,
    #[serde(default)]
    pub max_heart_rate: Option<i64>,
    #[serde(default)]
    pub kilojoule: Option<f64>,
    #[serde(default)]
    pub distance_meter: Option<f64>,
}

/// OAuth token endpoint response (code exchange and refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
}

/// Basic profile, used to record the Whoop-side user ID at connect time.
#[derive(Debug, Clone, Deserialize)]
pub struct WhoopProfile {
    pub user_id: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}
