// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-day journal rows and reference tables read by the aggregator.
//!
//! These collections are written by the app's journaling UI; the aggregator
//! only ever reads them, scoped to `(user_id, date)` except for the two
//! reference tables (`foods`, `exercises`) which are unscoped join maps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A logged meal. Food logs attach to it via `meal_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub name: String,
    /// Time of day the meal was eaten, used for ordering
    pub time_hour: u32,
    pub time_minute: u32,
}

/// One logged food item. `meal_id` is None for loose logs not attached
/// to any meal; those still count toward the day's nutrition totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodLog {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub food_id: String,
    pub meal_id: Option<String>,
    pub servings: f64,
}

/// Food reference row. Macro fields are per single serving; micronutrients
/// are None when the food's label doesn't list them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub potassium_mg: Option<f64>,
}

/// One strength exercise performed on a date. Sets attach via `exercise_log_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub exercise_id: String,
}

/// One set within an exercise log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub exercise_log_id: String,
    pub set_number: u32,
    pub reps: u32,
    /// None for bodyweight sets
    pub weight_kg: Option<f64>,
}

/// Exercise reference row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    /// e.g. "push", "pull", "legs", "core"
    pub category: String,
}

/// A cardio session logged for a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardioSession {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    /// e.g. "run", "bike", "row"
    pub kind: String,
    pub duration_minutes: u32,
    pub distance_km: Option<f64>,
}

/// Daily supplement intake, at most one row per `(user_id, date, supplement)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplementLog {
    pub user_id: String,
    pub date: NaiveDate,
    pub supplement: SupplementKind,
    /// Amount taken, in the supplement's own unit (g, IU, mg)
    pub amount: f64,
}

/// The fixed set of tracked supplements.
///
/// The summary document always contains an entry for every variant, with
/// amount 0 when no log row exists for the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplementKind {
    Creatine,
    FishOil,
    VitaminD3,
    Magnesium,
    Zinc,
    Ashwagandha,
}

impl SupplementKind {
    pub const ALL: [SupplementKind; 6] = [
        SupplementKind::Creatine,
        SupplementKind::FishOil,
        SupplementKind::VitaminD3,
        SupplementKind::Magnesium,
        SupplementKind::Zinc,
        SupplementKind::Ashwagandha,
    ];

    /// Stable key used in document IDs and the summary's supplements map.
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplementKind::Creatine => "creatine",
            SupplementKind::FishOil => "fish_oil",
            SupplementKind::VitaminD3 => "vitamin_d3",
            SupplementKind::Magnesium => "magnesium",
            SupplementKind::Zinc => "zinc",
            SupplementKind::Ashwagandha => "ashwagandha",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplement_keys_are_unique() {
        let mut keys: Vec<&str> = SupplementKind::ALL.iter().map(|k| k.as_str()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), SupplementKind::ALL.len());
    }

    #[test]
    fn test_supplement_serde_matches_key() {
        let json = serde_json::to_string(&SupplementKind::FishOil).unwrap();
        assert_eq!(json, "\"fish_oil\"");
        let parsed: SupplementKind = serde_json::from_str("\"vitamin_d3\"").unwrap();
        assert_eq!(parsed, SupplementKind::VitaminD3);
    }
}
