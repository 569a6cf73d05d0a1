// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily summary aggregation.
//!
//! Folds every per-day source (meals, food logs, supplements, exercise
//! sets, cardio, wearable metrics) into one denormalized `DailySummary`
//! document. All reads are issued concurrently and joined fail-fast: a
//! partial summary is never built, and never written. The fold itself is
//! a pure function over the fetched rows.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};

use crate::db::Db;
use crate::error::AppError;
use crate::models::{
    CardioSession, CardioSummary, DailyMetricsRow, DailySummary, Exercise, ExerciseLog,
    ExerciseSet, ExerciseSummary, Food, FoodItemSummary, FoodLog, Meal, MealSummary,
    NutritionTotals, SetSummary, SupplementKind, SupplementLog, WorkoutSummary,
};
use crate::time_utils::format_utc_rfc3339;

/// Builds and persists per-day summary documents.
#[derive(Clone)]
pub struct AggregationService {
    db: Db,
}

/// Everything the fold needs for one user/date, fetched up front.
pub struct AggregationInputs {
    pub user_id: String,
    pub date: NaiveDate,
    pub meals: Vec<Meal>,
    pub food_logs: Vec<FoodLog>,
    pub foods: Vec<Food>,
    pub exercise_logs: Vec<ExerciseLog>,
    pub exercise_sets: Vec<ExerciseSet>,
    pub exercises: Vec<Exercise>,
    pub cardio_sessions: Vec<CardioSession>,
    pub supplement_logs: Vec<(SupplementKind, Option<SupplementLog>)>,
    pub metrics: Option<DailyMetricsRow>,
}

impl AggregationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Read all per-day sources and fold them into a summary document.
    ///
    /// Pure read side: nothing is persisted. If any read fails the whole
    /// aggregation fails; re-running later is cheap and idempotent.
    pub async fn aggregate(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<DailySummary, AppError> {
        // One single-row lookup per known supplement, all in flight at once.
        let supplement_logs = async {
            futures_util::future::try_join_all(SupplementKind::ALL.iter().map(|kind| async move {
                let log = self.db.get_supplement_log(user_id, date, *kind).await?;
                Ok::<_, AppError>((*kind, log))
            }))
            .await
        };

        let (
            meals,
            food_logs,
            foods,
            exercise_logs,
            exercise_sets,
            exercises,
            cardio_sessions,
            metrics,
            supplement_logs,
        ) = tokio::try_join!(
            self.db.get_meals_for_date(user_id, date),
            self.db.get_food_logs_for_date(user_id, date),
            self.db.get_foods(),
            self.db.get_exercise_logs_for_date(user_id, date),
            self.db.get_exercise_sets_for_date(user_id, date),
            self.db.get_exercises(),
            self.db.get_cardio_for_date(user_id, date),
            self.db.get_daily_metrics(user_id, date),
            supplement_logs,
        )?;

        let inputs = AggregationInputs {
            user_id: user_id.to_string(),
            date,
            meals,
            food_logs,
            foods,
            exercise_logs,
            exercise_sets,
            exercises,
            cardio_sessions,
            supplement_logs,
            metrics,
        };

        Ok(build_daily_summary(inputs, &format_utc_rfc3339(Utc::now())))
    }

    /// Aggregate and persist, returning the stored document.
    pub async fn sync_summary(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<DailySummary, AppError> {
        let summary = self.aggregate(user_id, date).await?;
        self.db.set_daily_summary(&summary).await?;

        tracing::info!(
            user_id,
            date = %date,
            meals = summary.meals.len(),
            "Daily summary rebuilt"
        );

        Ok(summary)
    }
}

// ─── Pure Fold ───────────────────────────────────────────────────────────

/// Fold fetched rows into the summary document. Deterministic given its
/// inputs; `now` becomes the document's `updated_at`.
pub fn build_daily_summary(inputs: AggregationInputs, now: &str) -> DailySummary {
    let food_by_id: HashMap<&str, &Food> =
        inputs.foods.iter().map(|f| (f.id.as_str(), f)).collect();
    let exercise_by_id: HashMap<&str, &Exercise> =
        inputs.exercises.iter().map(|e| (e.id.as_str(), e)).collect();

    let meals = build_meal_summaries(&inputs.meals, &inputs.food_logs, &food_by_id);
    let nutrition = build_day_totals(&inputs.food_logs, &food_by_id);
    let supplements = build_supplements_map(&inputs.supplement_logs);
    let workout = build_workout_summary(
        &inputs.exercise_logs,
        &inputs.exercise_sets,
        &exercise_by_id,
        &inputs.cardio_sessions,
    );

    DailySummary {
        user_id: inputs.user_id,
        date: inputs.date,
        nutrition,
        meals,
        supplements,
        workout,
        whoop: inputs.metrics,
        updated_at: now.to_string(),
    }
}

/// Per-meal breakdown, meals in time-of-day order.
fn build_meal_summaries(
    meals: &[Meal],
    food_logs: &[FoodLog],
    food_by_id: &HashMap<&str, &Food>,
) -> Vec<MealSummary> {
    let mut ordered: Vec<&Meal> = meals.iter().collect();
    ordered.sort_by_key(|m| (m.time_hour, m.time_minute, m.id.clone()));

    ordered
        .into_iter()
        .map(|meal| {
            let mut items = Vec::new();
            let mut totals = NutritionTotals::default();

            for log in food_logs
                .iter()
                .filter(|l| l.meal_id.as_deref() == Some(meal.id.as_str()))
            {
                // Dangling food_id: nothing to scale, leave it out. A re-run
                // picks the item up once the reference row exists.
                let Some(food) = food_by_id.get(log.food_id.as_str()) else {
                    continue;
                };

                accumulate(&mut totals, food, log.servings);
                items.push(FoodItemSummary {
                    food_id: log.food_id.clone(),
                    name: food.name.clone(),
                    servings: log.servings,
                    calories: food.calories * log.servings,
                    protein_g: food.protein_g * log.servings,
                    fat_g: food.fat_g * log.servings,
                    carbs_g: food.carbs_g * log.servings,
                });
            }

            MealSummary {
                meal_id: meal.id.clone(),
                name: meal.name.clone(),
                time_hour: meal.time_hour,
                time_minute: meal.time_minute,
                items,
                totals,
            }
        })
        .collect()
}

/// Whole-day nutrition totals over every food log, attached to a meal or not.
fn build_day_totals(
    food_logs: &[FoodLog],
    food_by_id: &HashMap<&str, &Food>,
) -> NutritionTotals {
    let mut totals = NutritionTotals::default();
    for log in food_logs {
        if let Some(food) = food_by_id.get(log.food_id.as_str()) {
            accumulate(&mut totals, food, log.servings);
        }
    }
    totals
}

/// Add one food log's scaled values into a running total.
fn accumulate(totals: &mut NutritionTotals, food: &Food, servings: f64) {
    totals.calories += food.calories * servings;
    totals.protein_g += food.protein_g * servings;
    totals.fat_g += food.fat_g * servings;
    totals.carbs_g += food.carbs_g * servings;
    totals.fiber_g = add_optional(totals.fiber_g, food.fiber_g, servings);
    totals.sugar_g = add_optional(totals.sugar_g, food.sugar_g, servings);
    totals.sodium_mg = add_optional(totals.sodium_mg, food.sodium_mg, servings);
    totals.potassium_mg = add_optional(totals.potassium_mg, food.potassium_mg, servings);
}

/// Optional nutrients only start accumulating once a food supplies a value,
/// so a day with no data stays None instead of reading as a measured zero.
fn add_optional(acc: Option<f64>, per_serving: Option<f64>, servings: f64) -> Option<f64> {
    match per_serving {
        Some(value) => Some(acc.unwrap_or(0.0) + value * servings),
        None => acc,
    }
}

/// Fixed-shape supplements map: every known kind present, 0 when unlogged.
fn build_supplements_map(
    supplement_logs: &[(SupplementKind, Option<SupplementLog>)],
) -> BTreeMap<String, f64> {
    let mut map: BTreeMap<String, f64> = SupplementKind::ALL
        .iter()
        .map(|kind| (kind.as_str().to_string(), 0.0))
        .collect();

    for (kind, log) in supplement_logs {
        if let Some(log) = log {
            map.insert(kind.as_str().to_string(), log.amount);
        }
    }

    map
}

/// Strength + cardio summary with per-exercise set detail.
fn build_workout_summary(
    exercise_logs: &[ExerciseLog],
    exercise_sets: &[ExerciseSet],
    exercise_by_id: &HashMap<&str, &Exercise>,
    cardio_sessions: &[CardioSession],
) -> WorkoutSummary {
    let mut sets_by_log: HashMap<&str, Vec<&ExerciseSet>> = HashMap::new();
    for set in exercise_sets {
        sets_by_log
            .entry(set.exercise_log_id.as_str())
            .or_default()
            .push(set);
    }

    let mut ordered_logs: Vec<&ExerciseLog> = exercise_logs.iter().collect();
    ordered_logs.sort_by(|a, b| a.id.cmp(&b.id));

    let exercises: Vec<ExerciseSummary> = ordered_logs
        .into_iter()
        .map(|log| {
            let mut sets: Vec<&ExerciseSet> =
                sets_by_log.remove(log.id.as_str()).unwrap_or_default();
            sets.sort_by_key(|s| s.set_number);

            let total_reps: u32 = sets.iter().map(|s| s.reps).sum();
            let max_weight_kg = sets
                .iter()
                .filter_map(|s| s.weight_kg)
                .reduce(f64::max);

            let (name, category) = match exercise_by_id.get(log.exercise_id.as_str()) {
                Some(exercise) => (exercise.name.clone(), exercise.category.clone()),
                None => (log.exercise_id.clone(), "other".to_string()),
            };

            ExerciseSummary {
                exercise_id: log.exercise_id.clone(),
                name,
                category,
                total_sets: sets.len() as u32,
                total_reps,
                max_weight_kg,
                sets: sets
                    .into_iter()
                    .map(|s| SetSummary {
                        set_number: s.set_number,
                        reps: s.reps,
                        weight_kg: s.weight_kg,
                    })
                    .collect(),
            }
        })
        .collect();

    let mut cardio: Vec<&CardioSession> = cardio_sessions.iter().collect();
    cardio.sort_by(|a, b| a.id.cmp(&b.id));

    let cardio: Vec<CardioSummary> = cardio
        .into_iter()
        .map(|session| CardioSummary {
            kind: session.kind.clone(),
            duration_minutes: session.duration_minutes,
            distance_km: session.distance_km,
        })
        .collect();

    WorkoutSummary {
        total_exercises: exercises.len() as u32,
        total_sets: exercises.iter().map(|e| e.total_sets).sum(),
        total_cardio_minutes: cardio.iter().map(|c| c.duration_minutes).sum(),
        exercises,
        cardio,
    }
}
