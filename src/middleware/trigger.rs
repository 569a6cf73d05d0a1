// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret authentication for scheduled trigger routes.
//!
//! `/tasks/*` endpoints are called by the scheduler, not by users. The
//! scheduler sends the shared secret in `x-sync-secret`; anything else
//! is rejected with 401.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const SYNC_SECRET_HEADER: &str = "x-sync-secret";

/// Require the shared sync secret on `/tasks/*` routes.
pub async fn require_sync_secret(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided = request
        .headers()
        .get(SYNC_SECRET_HEADER)
        .and_then(|h| h.to_str().ok());

    let expected = state.config.sync_trigger_secret.as_bytes();

    match provided {
        // Constant-time comparison; the header is an authentication secret.
        Some(value) if bool::from(value.as_bytes().ct_eq(expected)) => {
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!("Blocked trigger request with missing or invalid sync secret");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
