// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::models::inquiry::STATUS_RECEIVED;
use crate::models::{
    Inquiry, QuotaKind, UsageMeter, UserProfile, UserSession, WordField, WordList, WordRecord,
};
use crate::routes::auth::cleared_session_cookie;
use crate::services::recommend::MAX_RECOMMEND_COUNT;
use crate::services::{BatchOutcome, NewWord, WordFilter, WordPage};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/words", get(list_words).post(add_word))
        .route("/api/words/{hanja}", delete(delete_word))
        .route("/api/recommendations", post(create_recommendations))
        .route("/api/inquiries", post(create_inquiry))
        .route("/api/account", delete(delete_account))
}

fn validate_body<T: Validate>(body: &T) -> Result<()> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub email: String,
    pub word_usage: UsageMeter,
    pub ai_usage: UsageMeter,
}

/// Get the signed-in user's usage meters.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<MeResponse>> {
    let profile: UserProfile = state
        .store
        .get_profile(&session.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", session.email)))?;

    Ok(Json(MeResponse {
        email: session.email,
        word_usage: profile.meter(QuotaKind::Words),
        ai_usage: profile.meter(QuotaKind::Ai),
    }))
}

// ─── Word Lists ──────────────────────────────────────────────

#[derive(Deserialize)]
struct WordsQuery {
    /// Which list to read (defaults to the manual list)
    list: Option<WordList>,
    #[serde(default)]
    field: WordField,
    #[serde(default)]
    search: String,
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

/// Search one of the user's word lists.
async fn list_words(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<UserSession>,
    Query(params): Query<WordsQuery>,
) -> Result<Json<WordPage>> {
    let filter = WordFilter {
        field: params.field,
        search: params.search,
        offset: params.offset,
        limit: params.limit,
    };
    let list = params.list.unwrap_or(WordList::Manual);

    let page = state.words.query(&session, list, &filter).await?;
    Ok(Json(page))
}

/// Body for adding a word by hand.
#[derive(Debug, Deserialize, Validate)]
pub struct AddWordRequest {
    #[validate(length(min = 1, max = 4, message = "hanja is required"))]
    pub hanja: String,
    #[validate(length(min = 1, max = 50))]
    pub meaning: String,
    #[validate(range(min = 1, max = 100))]
    pub stroke: u32,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub description: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AddWordResponse {
    pub word: WordRecord,
    pub word_usage: UsageMeter,
}

/// Add a word to the manual list.
async fn add_word(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<UserSession>,
    Json(body): Json<AddWordRequest>,
) -> Result<(StatusCode, Json<AddWordResponse>)> {
    validate_body(&body)?;

    let (word, word_usage) = state
        .words
        .add_word(
            &session,
            NewWord {
                hanja: body.hanja,
                meaning: body.meaning,
                stroke: body.stroke,
                description: body.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AddWordResponse { word, word_usage })))
}

/// Delete a character from both lists.
async fn delete_word(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<UserSession>,
    Path(hanja): Path<String>,
) -> Result<StatusCode> {
    state.words.delete_word(&session, &hanja).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Recommendations ─────────────────────────────────────────

/// Body for an AI recommendation request.
#[derive(Debug, Deserialize, Validate)]
pub struct RecommendationRequest {
    #[validate(length(min = 1, max = 100, message = "topic is required"))]
    pub topic: String,
    #[validate(range(min = 1, max = MAX_RECOMMEND_COUNT))]
    pub count: u32,
}

/// Recommend characters on a topic and store as many as the AI quota allows.
///
/// Returns 200 with the aggregate even when some records hit the quota.
async fn create_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<UserSession>,
    Json(body): Json<RecommendationRequest>,
) -> Result<Json<BatchOutcome>> {
    validate_body(&body)?;

    let outcome = state
        .recommender
        .recommend_and_persist_batch(&session, &body.topic, body.count)
        .await?;

    Ok(Json(outcome))
}

// ─── Inquiries ───────────────────────────────────────────────

/// Body for a support inquiry.
#[derive(Debug, Deserialize, Validate)]
pub struct InquiryRequest {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct InquiryResponse {
    pub id: String,
    pub status: String,
}

/// File a support inquiry.
async fn create_inquiry(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<UserSession>,
    Json(body): Json<InquiryRequest>,
) -> Result<(StatusCode, Json<InquiryResponse>)> {
    validate_body(&body)?;

    let inquiry = Inquiry {
        email: session.email.clone(),
        subject: body.subject.trim().to_string(),
        message: body.message.trim().to_string(),
        timestamp: now_rfc3339(),
        status: STATUS_RECEIVED.to_string(),
    };

    let id = state.store.add_inquiry(&inquiry).await?;
    tracing::info!(email = %session.email, inquiry_id = %id, "Inquiry filed");

    Ok((
        StatusCode::CREATED,
        Json(InquiryResponse {
            id,
            status: inquiry.status,
        }),
    ))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    /// Documents removed
    pub deleted: usize,
}

/// Delete the user's profile and both word lists.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<UserSession>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<DeleteAccountResponse>)> {
    tracing::info!(email = %session.email, "User-initiated account deletion");

    let deleted = state.store.delete_user_data(&session.email).await?;

    tracing::info!(email = %session.email, deleted, "Account data deleted");

    Ok((
        jar.add(cleared_session_cookie(&state)),
        Json(DeleteAccountResponse {
            success: true,
            deleted,
        }),
    ))
}
