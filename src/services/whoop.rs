// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop API client for fetching wearable data.
//!
//! Handles:
//! - Cursor-paginated collection fetches (cycles, recovery, sleep, workouts)
//! - OAuth code exchange and token refresh
//! - Token lifecycle with proactive refresh and per-user de-duplication

use crate::error::AppError;
use crate::models::whoop::{
    Cycle, PagedResponse, Recovery, Sleep, TokenResponse, WhoopProfile, Workout,
};
use crate::time_utils::{day_end_param, day_start_param};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;

const WHOOP_API_BASE: &str = "https://api.prod.whoop.com/developer";
const WHOOP_TOKEN_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/token";

/// Records per page on collection endpoints.
const PAGE_LIMIT: u32 = 25;

/// Request timeout. The Whoop API has no documented SLA; without this a
/// stalled connection would hang a whole sync.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Whoop API client.
#[derive(Clone)]
pub struct WhoopClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl WhoopClient {
    /// Create a new Whoop client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::new_with_base_url(WHOOP_API_BASE, WHOOP_TOKEN_URL, client_id, client_secret)
    }

    /// Create a client pointing at a custom base URL (tests use a mock server).
    pub fn new_with_base_url(
        base_url: &str,
        token_url: &str,
        client_id: String,
        client_secret: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            client_id,
            client_secret,
        }
    }

    // ─── Paginated Collection Fetches ────────────────────────────────────

    /// Fetch every page of a collection endpoint for a date range.
    ///
    /// Issues GET requests with `start`/`end` bounds covering the whole
    /// days and follows `next_token` until the API stops returning one.
    /// Any non-2xx aborts the whole fetch; the caller re-invokes from
    /// scratch for this endpoint, there is no partial-page retry.
    pub async fn fetch_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<T>, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let start = day_start_param(start_date);
        let end = day_end_param(end_date);

        let mut records = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("limit", PAGE_LIMIT.to_string()),
                ("start", start.clone()),
                ("end", end.clone()),
            ];
            if let Some(token) = &next_token {
                query.push(("nextToken", token.clone()));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await
                .map_err(|e| AppError::WhoopApi(format!("GET {} failed: {}", path, e)))?;

            let page: PagedResponse<T> = self.check_response_json(path, response).await?;

            records.extend(page.records);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(records)
    }

    /// Fetch all physiological cycles overlapping the date range.
    pub async fn get_cycles(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Cycle>, AppError> {
        self.fetch_all_pages("/v1/cycle", access_token, start_date, end_date)
            .await
    }

    /// Fetch all recovery records for the date range.
    pub async fn get_recoveries(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Recovery>, AppError> {
        self.fetch_all_pages("/v1/recovery", access_token, start_date, end_date)
            .await
    }

    /// Fetch all sleep activities for the date range.
    pub async fn get_sleeps(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Sleep>, AppError> {
        self.fetch_all_pages("/v1/activity/sleep", access_token, start_date, end_date)
            .await
    }

    /// Fetch all workouts for the date range.
    pub async fn get_workouts(
        &self,
        access_token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Workout>, AppError> {
        self.fetch_all_pages("/v1/activity/workout", access_token, start_date, end_date)
            .await
    }

    // ─── OAuth ───────────────────────────────────────────────────────────

    /// Refresh an expired access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::WhoopApi(format!("Token refresh request failed: {}", e)))?;

        self.check_response_json("/oauth/token", response).await
    }

    /// Exchange an authorization code for the initial token pair.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::WhoopApi(format!("Token exchange failed: {}", e)))?;

        self.check_response_json("/oauth/token", response).await
    }

    /// Get the authenticated user's basic profile.
    pub async fn get_profile(&self, access_token: &str) -> Result<WhoopProfile, AppError> {
        let url = format!("{}/v1/user/profile/basic", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                AppError::WhoopApi(format!("GET /v1/user/profile/basic failed: {}", e))
            })?;

        self.check_response_json("/v1/user/profile/basic", response)
            .await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::WhoopApi(format!(
                "{}: HTTP {}: {}",
                endpoint, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::WhoopApi(format!("{}: JSON parse error: {}", endpoint, e)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WhoopService - token lifecycle on top of the raw client
// ─────────────────────────────────────────────────────────────────────────────

use crate::db::Db;
use crate::models::WhoopCredential;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Cached access token with expiry information.
#[derive(Clone)]
pub struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(access_token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            expires_at,
        }
    }
}

/// Shared token cache type for use in AppState.
pub type TokenCache = Arc<DashMap<String, CachedToken>>;

/// Shared refresh locks type for use in AppState.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Whether a token expiring at `expires_at` should be refreshed now.
///
/// A token within the 5-minute margin counts as expired, so in-flight
/// requests never race an expiry.
fn is_expiring(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= expires_at
}

/// High-level Whoop service that manages token lifecycle and API access.
///
/// This service encapsulates:
/// - Credential retrieval from Firestore
/// - Automatic token refresh when expiring (with 5-minute margin)
/// - Credential deletion when a refresh irrecoverably fails
/// - In-memory token caching to skip repeated credential reads
/// - Per-user locking to prevent duplicate refresh calls
#[derive(Clone)]
pub struct WhoopService {
    client: WhoopClient,
    db: Db,
    /// In-memory cache of access tokens (shared across requests).
    token_cache: TokenCache,
    /// Per-user mutex to serialize token refresh operations.
    refresh_locks: RefreshLocks,
}

impl WhoopService {
    /// Create a new Whoop service with shared token cache.
    ///
    /// The `token_cache` and `refresh_locks` should be shared across all
    /// `WhoopService` instances within the process.
    pub fn new(
        client_id: String,
        client_secret: String,
        db: Db,
        token_cache: TokenCache,
        refresh_locks: RefreshLocks,
    ) -> Self {
        Self::with_client(
            WhoopClient::new(client_id, client_secret),
            db,
            token_cache,
            refresh_locks,
        )
    }

    /// Create a service around an existing client (tests inject a mock-server client).
    pub fn with_client(
        client: WhoopClient,
        db: Db,
        token_cache: TokenCache,
        refresh_locks: RefreshLocks,
    ) -> Self {
        Self {
            client,
            db,
            token_cache,
            refresh_locks,
        }
    }

    /// The raw API client. Callers obtain a token via
    /// [`get_valid_access_token`](Self::get_valid_access_token) first and
    /// reuse it across the fetches of one sync.
    pub fn client(&self) -> &WhoopClient {
        &self.client
    }

    // ─── Token Management ────────────────────────────────────────────────

    /// Get a valid (non-expired) access token for the given user.
    ///
    /// Returns `Ok(None)` when the user has no usable credential: either
    /// none is stored, or the stored one expired and the refresh failed
    /// (in which case the credential is deleted — the refresh token was
    /// consumed and the user must re-authorize).
    ///
    /// Callers never inspect expiry themselves; this is the only place
    /// expiry and refresh races are handled.
    pub async fn get_valid_access_token(
        &self,
        user_id: &str,
    ) -> Result<Option<String>, AppError> {
        let now = Utc::now();

        // Fast path: cached token still valid, no I/O.
        if let Some(cached) = self.token_cache.get(user_id) {
            if !is_expiring(cached.expires_at, now) {
                return Ok(Some(cached.access_token.clone()));
            }
            // Expired or expiring soon - fall through to refresh
        }

        // Only one task per user performs the refresh; the rest wait here.
        let lock = self
            .refresh_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        // Re-check after acquiring the lock: another task may have
        // refreshed while we were waiting.
        if let Some(cached) = self.token_cache.get(user_id) {
            if !is_expiring(cached.expires_at, now) {
                return Ok(Some(cached.access_token.clone()));
            }
        }

        let Some(credential) = self.db.get_credential(user_id).await? else {
            return Ok(None);
        };

        let expires_at = DateTime::parse_from_rfc3339(&credential.expires_at)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to parse expiry: {}", e)))?
            .with_timezone(&Utc);

        if !is_expiring(expires_at, now) {
            // Stored token is still valid - cache and return unchanged.
            self.token_cache.insert(
                user_id.to_string(),
                CachedToken {
                    access_token: credential.access_token.clone(),
                    expires_at,
                },
            );
            return Ok(Some(credential.access_token));
        }

        tracing::info!(user_id, "Access token expired, refreshing");

        let new_tokens = match self.client.refresh_token(&credential.refresh_token).await {
            Ok(t) => t,
            Err(err) => {
                // The refresh token is spent or revoked; a stale credential
                // would fail every future sync, so delete it now and make
                // the user re-authorize.
                tracing::warn!(
                    user_id,
                    error = %err,
                    "Token refresh failed, deleting credential"
                );
                self.token_cache.remove(user_id);
                self.db.delete_credential(user_id).await?;
                return Ok(None);
            }
        };

        let new_expires_at = now + Duration::seconds(new_tokens.expires_in);

        let updated = WhoopCredential {
            user_id: user_id.to_string(),
            access_token: new_tokens.access_token.clone(),
            refresh_token: new_tokens.refresh_token,
            expires_at: format_utc_rfc3339(new_expires_at),
            // Refresh rotates tokens but the Whoop account is unchanged.
            whoop_user_id: credential.whoop_user_id,
        };

        self.db.set_credential(&updated).await?;

        self.token_cache.insert(
            user_id.to_string(),
            CachedToken {
                access_token: new_tokens.access_token.clone(),
                expires_at: new_expires_at,
            },
        );

        tracing::info!(user_id, "Token refreshed and cached");
        Ok(Some(new_tokens.access_token))
    }

    // ─── Connection Lifecycle ────────────────────────────────────────────

    /// Handle OAuth callback: exchange the code, look up the Whoop user ID,
    /// and store the credential.
    pub async fn connect_with_code(
        &self,
        user_id: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<(), AppError> {
        let tokens = self.client.exchange_code(code, redirect_uri).await?;

        // The profile is only needed for the external user id; a failure
        // here shouldn't lose the freshly-issued tokens.
        let whoop_user_id = match self.client.get_profile(&tokens.access_token).await {
            Ok(profile) => Some(profile.user_id),
            Err(err) => {
                tracing::warn!(user_id, error = %err, "Failed to fetch Whoop profile, continuing without it");
                None
            }
        };

        let expires_at = Utc::now() + Duration::seconds(tokens.expires_in);

        let credential = WhoopCredential {
            user_id: user_id.to_string(),
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token,
            expires_at: format_utc_rfc3339(expires_at),
            whoop_user_id,
        };

        self.db.set_credential(&credential).await?;

        self.token_cache.insert(
            user_id.to_string(),
            CachedToken {
                access_token: tokens.access_token,
                expires_at,
            },
        );

        tracing::info!(user_id, ?whoop_user_id, "Whoop connected");
        Ok(())
    }

    /// Whether the user currently has a stored credential.
    pub async fn is_connected(&self, user_id: &str) -> Result<bool, AppError> {
        Ok(self.db.get_credential(user_id).await?.is_some())
    }

    /// Disconnect: drop the cached token and delete the stored credential.
    pub async fn disconnect(&self, user_id: &str) -> Result<(), AppError> {
        self.token_cache.remove(user_id);
        self.db.delete_credential(user_id).await?;
        tracing::info!(user_id, "Whoop disconnected");
        Ok(())
    }
}
