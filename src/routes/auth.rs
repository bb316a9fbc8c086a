// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in and sign-out routes.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::{QuotaKind, UsageMeter};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(create_session))
        .route("/auth/logout", post(logout))
}

/// Session created for a verified user.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub token: String,
    pub email: String,
    /// True on first sign-in, when the profile was just created
    pub new_user: bool,
    pub word_usage: UsageMeter,
    pub ai_usage: UsageMeter,
}

/// Exchange a Firebase ID token (sent as a Bearer token) for a session.
///
/// Creates the user's profile with default quotas on first sign-in.
async fn create_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let id_token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;

    let identity = state.auth_verifier.verify_id_token(id_token).await?;

    let (profile, new_user) = state
        .store
        .ensure_profile(&identity.email, state.config.profile_defaults)
        .await?;

    if new_user {
        tracing::info!(email = %identity.email, "Created profile for new user");
    }

    let token = create_jwt(&identity.email, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = session_cookie(
        token.clone(),
        time::Duration::seconds(SESSION_TTL_SECS as i64),
        state.config.frontend_url.starts_with("https://"),
    );

    tracing::info!(email = %identity.email, "Session created");

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            token,
            email: identity.email,
            new_user,
            word_usage: profile.meter(QuotaKind::Words),
            ai_usage: profile.meter(QuotaKind::Ai),
        }),
    ))
}

/// Clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.add(cleared_session_cookie(&state)), StatusCode::NO_CONTENT)
}

/// Expired session cookie that makes the browser drop `hanja_token`.
pub(crate) fn cleared_session_cookie(state: &AppState) -> Cookie<'static> {
    session_cookie(
        String::new(),
        time::Duration::ZERO,
        state.config.frontend_url.starts_with("https://"),
    )
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn session_cookie(value: String, max_age: time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}
