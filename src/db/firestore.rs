// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Whoop credentials (one per user)
//! - Daily wearable metrics and cached workouts (composite-key upserts)
//! - Daily summary documents
//! - Read-only journal queries used by the aggregator
//!
//! Composite upsert keys are encoded into document IDs
//! (`{user_id}_{date}`, `{user_id}_{workout_id}`), so re-writing a key
//! overwrites the document instead of appending.

use chrono::NaiveDate;
use futures_util::{stream, StreamExt};

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    CachedWorkout, CardioSession, DailyMetricsRow, DailySummary, Exercise, ExerciseLog,
    ExerciseSet, Food, FoodLog, Meal, SupplementKind, SupplementLog, WhoopCredential,
};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct Db {
    client: Option<firestore::FirestoreDb>,
}

impl Db {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Credential Operations ───────────────────────────────────

    /// Get the Whoop credential for a user.
    pub async fn get_credential(&self, user_id: &str) -> Result<Option<WhoopCredential>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WHOOP_CREDENTIALS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store (upsert) the Whoop credential for a user.
    pub async fn set_credential(&self, credential: &WhoopCredential) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WHOOP_CREDENTIALS)
            .document_id(&credential.user_id)
            .object(credential)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete the Whoop credential (refresh failure or disconnect).
    pub async fn delete_credential(&self, user_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::WHOOP_CREDENTIALS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List every stored credential (all connected users, for batch sync).
    pub async fn list_credentials(&self) -> Result<Vec<WhoopCredential>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WHOOP_CREDENTIALS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Wearable Metrics Operations ─────────────────────────────

    /// Get the wearable metrics row for a user/date.
    pub async fn get_daily_metrics(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyMetricsRow>, AppError> {
        let doc_id = format!("{}_{}", user_id, date.format("%Y-%m-%d"));
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_METRICS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert a batch of wearable metrics rows keyed on `(user_id, date)`.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    pub async fn batch_upsert_daily_metrics(
        &self,
        rows: &[DailyMetricsRow],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(rows.to_vec())
            .map(|row| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::DAILY_METRICS)
                    .document_id(row.doc_id())
                    .object(&row)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    /// Upsert a batch of cached workouts keyed on `(user_id, workout_id)`.
    pub async fn batch_upsert_workouts(&self, rows: &[CachedWorkout]) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(rows.to_vec())
            .map(|row| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::CACHED_WORKOUTS)
                    .document_id(row.doc_id())
                    .object(&row)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    // ─── Daily Summary Operations ────────────────────────────────

    /// Get the summary document for a user/date.
    pub async fn get_daily_summary(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySummary>, AppError> {
        let doc_id = format!("{}_{}", user_id, date.format("%Y-%m-%d"));
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_SUMMARIES)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert the summary document keyed on `(user_id, date)`.
    pub async fn set_daily_summary(&self, summary: &DailySummary) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DAILY_SUMMARIES)
            .document_id(summary.doc_id())
            .object(summary)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Journal Reads (aggregator inputs) ───────────────────────

    /// Helper: query a collection filtered to one user and date.
    async fn query_for_date<T>(
        &self,
        collection: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        let user_id = user_id.to_string();
        let date = date.format("%Y-%m-%d").to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("date").eq(date.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_meals_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Meal>, AppError> {
        self.query_for_date(collections::MEALS, user_id, date).await
    }

    pub async fn get_food_logs_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<FoodLog>, AppError> {
        self.query_for_date(collections::FOOD_LOGS, user_id, date)
            .await
    }

    pub async fn get_exercise_logs_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ExerciseLog>, AppError> {
        self.query_for_date(collections::EXERCISE_LOGS, user_id, date)
            .await
    }

    pub async fn get_exercise_sets_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ExerciseSet>, AppError> {
        self.query_for_date(collections::EXERCISE_SETS, user_id, date)
            .await
    }

    pub async fn get_cardio_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CardioSession>, AppError> {
        self.query_for_date(collections::CARDIO_SESSIONS, user_id, date)
            .await
    }

    /// Full foods reference table, used as an in-memory join map.
    pub async fn get_foods(&self) -> Result<Vec<Food>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FOODS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Full exercises reference table, used as an in-memory join map.
    pub async fn get_exercises(&self) -> Result<Vec<Exercise>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EXERCISES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Single-row-or-none lookup for one supplement's log on a date.
    pub async fn get_supplement_log(
        &self,
        user_id: &str,
        date: NaiveDate,
        kind: SupplementKind,
    ) -> Result<Option<SupplementLog>, AppError> {
        let doc_id = format!(
            "{}_{}_{}",
            user_id,
            date.format("%Y-%m-%d"),
            kind.as_str()
        );
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUPPLEMENT_LOGS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert one supplement log row (used by tests and the journal API).
    pub async fn set_supplement_log(&self, log: &SupplementLog) -> Result<(), AppError> {
        let doc_id = format!(
            "{}_{}_{}",
            log.user_id,
            log.date.format("%Y-%m-%d"),
            log.supplement.as_str()
        );
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUPPLEMENT_LOGS)
            .document_id(&doc_id)
            .object(log)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
