// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whoop OAuth connection routes.
//!
//! `GET /api/whoop/connect` (session required) redirects to Whoop's
//! authorize page with an HMAC-signed `state` carrying the user ID.
//! `GET /auth/whoop/callback` (public - the browser arrives here from
//! Whoop) verifies the state, exchanges the code and stores the
//! credential. A deleted credential (failed refresh, disconnect) is
//! re-established by going through this flow again.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

const WHOOP_AUTHORIZE_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/auth";
const OAUTH_SCOPES: &str = "offline read:recovery read:cycles read:sleep read:workout read:profile";

/// Maximum age of a signed state before the callback rejects it.
const STATE_MAX_AGE_MILLIS: u128 = 60 * 60 * 1000;

/// Public routes (the OAuth provider redirects the browser here).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/whoop/callback", get(auth_callback))
}

/// Session-protected routes (mounted behind the auth middleware).
pub fn connect_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/whoop/connect", get(connect_start))
}

/// Start the OAuth flow - redirect to Whoop authorization.
async fn connect_start(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<AuthUser>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let oauth_state = sign_state(&state.config.oauth_state_key, &user.user_id, timestamp)?;
    let callback_url = callback_url_from_headers(&headers);

    let auth_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
        WHOOP_AUTHORIZE_URL,
        state.config.whoop_client_id,
        urlencoding::encode(&callback_url),
        urlencoding::encode(OAUTH_SCOPES),
        oauth_state
    );

    tracing::info!(user_id = %user.user_id, "Starting Whoop OAuth flow");

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code, store credential.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let frontend = &state.config.frontend_url;

    let Some(user_id) = verify_state(&state.config.oauth_state_key, &params.state) else {
        tracing::warn!("Whoop callback with invalid or expired state");
        return Redirect::temporary(&format!("{}/settings?whoop=error", frontend));
    };

    if let Some(error) = params.error {
        tracing::warn!(user_id = %user_id, error = %error, "User denied Whoop authorization");
        return Redirect::temporary(&format!("{}/settings?whoop=denied", frontend));
    }

    let Some(code) = params.code else {
        return Redirect::temporary(&format!("{}/settings?whoop=error", frontend));
    };

    let callback_url = callback_url_from_headers(&headers);

    match state
        .whoop
        .connect_with_code(&user_id, &code, &callback_url)
        .await
    {
        Ok(()) => Redirect::temporary(&format!("{}/settings?whoop=connected", frontend)),
        Err(err) => {
            tracing::error!(user_id = %user_id, error = %err, "Whoop connect failed");
            Redirect::temporary(&format!("{}/settings?whoop=error", frontend))
        }
    }
}

/// Build the callback URL from the request's Host header.
fn callback_url_from_headers(headers: &axum::http::HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost:8080");

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}/auth/whoop/callback", scheme, host)
}

/// Sign `user_id|timestamp_hex` and base64-encode the whole state.
fn sign_state(key: &[u8], user_id: &str, timestamp_millis: u128) -> Result<String> {
    let payload = format!("{}|{:x}", user_id, timestamp_millis);

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify a signed state and return the embedded user ID.
///
/// Returns None on any defect: bad encoding, bad signature, or a
/// timestamp older than an hour.
fn verify_state(key: &[u8], state: &str) -> Option<String> {
    let decoded = URL_SAFE_NO_PAD.decode(state).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let mut parts = decoded.rsplitn(2, '|');
    let signature_hex = parts.next()?;
    let payload = parts.next()?;

    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    let signature = hex::decode(signature_hex).ok()?;
    mac.verify_slice(&signature).ok()?;

    let mut fields = payload.rsplitn(2, '|');
    let timestamp_hex = fields.next()?;
    let user_id = fields.next()?;

    let timestamp = u128::from_str_radix(timestamp_hex, 16).ok()?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_millis();
    if now.saturating_sub(timestamp) > STATE_MAX_AGE_MILLIS {
        return None;
    }

    Some(user_id.to_string())
}
