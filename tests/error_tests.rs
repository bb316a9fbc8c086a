// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use hanja_trainer::error::AppError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_status_and_code_mapping() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED, "unauthorized"),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED, "invalid_token"),
        (
            AppError::NotFound("Word 木 not found".to_string()),
            StatusCode::NOT_FOUND,
            "not_found",
        ),
        (
            AppError::BadRequest("Topic must not be empty".to_string()),
            StatusCode::BAD_REQUEST,
            "bad_request",
        ),
        (
            AppError::QuotaExceeded { used: 10, max: 10 },
            StatusCode::TOO_MANY_REQUESTS,
            "quota_exceeded",
        ),
        (AppError::EmptyResult, StatusCode::BAD_GATEWAY, "empty_result"),
        (
            AppError::Backend("HTTP 503".to_string()),
            StatusCode::BAD_GATEWAY,
            "backend_error",
        ),
        (
            AppError::Database("deadline exceeded".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
        ),
        (
            AppError::Internal(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
        ),
    ];

    for (err, status, code) in cases {
        let (actual_status, body) = render(err).await;
        assert_eq!(actual_status, status, "{code}");
        assert_eq!(body["error"], code);
    }
}

#[tokio::test]
async fn test_quota_details_include_counts() {
    let (_, body) = render(AppError::QuotaExceeded { used: 50, max: 50 }).await;
    assert!(body["details"].as_str().unwrap().contains("50/50"));
}

#[tokio::test]
async fn test_internal_details_not_leaked() {
    let (_, body) = render(AppError::Database("secret connection string".to_string())).await;
    assert!(body.get("details").is_none());

    let (_, body) = render(AppError::Internal(anyhow::anyhow!("stack trace"))).await;
    assert!(body.get("details").is_none());
}

#[test]
fn test_is_quota_exceeded() {
    assert!(AppError::QuotaExceeded { used: 1, max: 1 }.is_quota_exceeded());
    assert!(!AppError::EmptyResult.is_quota_exceeded());
    assert!(!AppError::Backend("quota".to_string()).is_quota_exceeded());
}
