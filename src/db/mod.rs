//! Database layer (Firestore).

pub mod firestore;

pub use firestore::Db;

/// Collection names as constants.
pub mod collections {
    /// Whoop OAuth credentials (keyed by user_id)
    pub const WHOOP_CREDENTIALS: &str = "whoop_credentials";
    /// Per-day wearable metrics (keyed by user_id + date)
    pub const DAILY_METRICS: &str = "whoop_daily_metrics";
    /// Cached remote workouts (keyed by user_id + workout_id)
    pub const CACHED_WORKOUTS: &str = "whoop_workouts";
    /// Denormalized per-day summaries (keyed by user_id + date)
    pub const DAILY_SUMMARIES: &str = "daily_summaries";

    // Journal collections, written by the app UI and read here.
    pub const MEALS: &str = "meals";
    pub const FOOD_LOGS: &str = "food_logs";
    pub const FOODS: &str = "foods";
    pub const EXERCISE_LOGS: &str = "exercise_logs";
    pub const EXERCISE_SETS: &str = "exercise_sets";
    pub const EXERCISES: &str = "exercises";
    pub const CARDIO_SESSIONS: &str = "cardio_sessions";
    pub const SUPPLEMENT_LOGS: &str = "supplement_logs";
}
