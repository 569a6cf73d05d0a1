//! Stored Whoop OAuth credential.

use serde::{Deserialize, Serialize};

/// OAuth credential for a user's Whoop connection (at most one per user).
///
/// Stored keyed by `user_id`; deleted outright when a refresh fails, since
/// the refresh token is single-use and a failed rotation cannot be retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoopCredential {
    /// Application user ID (also used as document ID)
    pub user_id: String,
    /// Current access token
    pub access_token: String,
    /// Current refresh token (rotates on every refresh)
    pub refresh_token: String,
    /// When the access token expires (ISO 8601)
    pub expires_at: String,
    /// Whoop's numeric user ID, when the profile fetch succeeded
    pub whoop_user_id: Option<u64>,
}
