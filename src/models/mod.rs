// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod credential;
pub mod journal;
pub mod metrics;
pub mod summary;
pub mod whoop;

pub use credential::WhoopCredential;
pub use journal::{
    CardioSession, Exercise, ExerciseLog, ExerciseSet, Food, FoodLog, Meal, SupplementKind,
    SupplementLog,
};
pub use metrics::{CachedWorkout, DailyMetricsRow};
pub use summary::{
    CardioSummary, DailySummary, ExerciseSummary, FoodItemSummary, MealSummary, NutritionTotals,
    SetSummary, WorkoutSummary,
};
