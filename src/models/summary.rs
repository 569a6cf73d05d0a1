//! Denormalized per-day summary document for dashboard reads.
//!
//! One document per `(user_id, date)`, rebuilt wholesale by the aggregator.
//! Reading a day's dashboard costs one document instead of a join across
//! eight collections.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::DailyMetricsRow;

/// Pre-computed summary of everything logged for one user on one date.
///
/// This is a pure read-side projection: derived, never hand-edited, and
/// fully replaceable by re-running aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub user_id: String,
    pub date: NaiveDate,
    /// Whole-day nutrition totals over every food log, attached or not
    pub nutrition: NutritionTotals,
    /// Meals in time-of-day order, each with its item breakdown
    pub meals: Vec<MealSummary>,
    /// Amount per known supplement, 0 when nothing was logged
    pub supplements: BTreeMap<String, f64>,
    pub workout: WorkoutSummary,
    /// Wearable metrics row for the date, verbatim, or None if not synced
    pub whoop: Option<DailyMetricsRow>,
    /// When this document was last rebuilt (ISO 8601)
    pub updated_at: String,
}

impl DailySummary {
    /// Document ID encoding the `(user_id, date)` upsert key.
    pub fn doc_id(&self) -> String {
        format!("{}_{}", self.user_id, self.date.format("%Y-%m-%d"))
    }
}

/// Nutrition totals. Macros always accumulate (0 when nothing logged);
/// micronutrients stay None until some food actually supplied a value,
/// so "no data" is distinguishable from a measured zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub potassium_mg: Option<f64>,
}

/// One meal with its food items and subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealSummary {
    pub meal_id: String,
    pub name: String,
    pub time_hour: u32,
    pub time_minute: u32,
    pub items: Vec<FoodItemSummary>,
    pub totals: NutritionTotals,
}

/// One food log entry scaled by its servings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemSummary {
    pub food_id: String,
    pub name: String,
    pub servings: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

/// Strength and cardio work for the day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub exercises: Vec<ExerciseSummary>,
    pub cardio: Vec<CardioSummary>,
    pub total_exercises: u32,
    pub total_sets: u32,
    pub total_cardio_minutes: u32,
}

/// One exercise with its sets in set-number order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub exercise_id: String,
    pub name: String,
    pub category: String,
    pub sets: Vec<SetSummary>,
    pub total_sets: u32,
    pub total_reps: u32,
    /// None when no set in this exercise recorded a weight
    pub max_weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSummary {
    pub set_number: u32,
    pub reps: u32,
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardioSummary {
    pub kind: String,
    pub duration_minutes: u32,
    pub distance_km: Option<f64>,
}
