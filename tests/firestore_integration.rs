// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST=localhost:8080`). Each test uses its own email
//! so runs against a shared emulator do not interfere.

use hanja_trainer::db::WordStore;
use hanja_trainer::error::AppError;
use hanja_trainer::models::inquiry::STATUS_RECEIVED;
use hanja_trainer::models::{Inquiry, ProfileDefaults, QuotaKind, WordList, WordRecord};

mod common;
use common::{test_db, unique_email};

fn record(hanja: &str, created_at: &str) -> WordRecord {
    WordRecord {
        hanja: hanja.to_string(),
        meaning: Some("뜻".to_string()),
        stroke: Some(4),
        description: Some("설명".to_string()),
        created_at: created_at.to_string(),
    }
}

fn small_quota() -> ProfileDefaults {
    ProfileDefaults {
        max_word_count: 2,
        max_ai_usage: 2,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_ensure_profile_creates_once() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email();

    assert!(db.get_profile(&email).await.unwrap().is_none());

    let (profile, created) = db.ensure_profile(&email, small_quota()).await.unwrap();
    assert!(created);
    assert_eq!(profile.max_ai_usage, 2);

    let (_, created_again) = db
        .ensure_profile(&email, ProfileDefaults::default())
        .await
        .unwrap();
    assert!(!created_again);

    // Second call must not reset the quotas
    let stored = db.get_profile(&email).await.unwrap().unwrap();
    assert_eq!(stored.max_ai_usage, 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// QUOTA TRANSACTION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_charge_until_quota_exhausted() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email();
    db.ensure_profile(&email, small_quota()).await.unwrap();

    for (i, hanja) in ["木", "水"].iter().enumerate() {
        let meter = db
            .charge_and_store(
                &email,
                QuotaKind::Ai,
                WordList::Ai,
                &record(hanja, "2026-01-01T00:00:00.000Z"),
            )
            .await
            .unwrap();
        assert_eq!(meter.used, i as u32 + 1);
    }

    let err = db
        .charge_and_store(
            &email,
            QuotaKind::Ai,
            WordList::Ai,
            &record("火", "2026-01-01T00:00:00.000Z"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuotaExceeded { used: 2, max: 2 }));

    let profile = db.get_profile(&email).await.unwrap().unwrap();
    assert_eq!(profile.ai_usage, 2);
    assert!(db
        .get_word(&email, WordList::Ai, "火")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_concurrent_charges_do_not_lose_updates() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email();
    db.ensure_profile(
        &email,
        ProfileDefaults {
            max_word_count: 50,
            max_ai_usage: 5,
        },
    )
    .await
    .unwrap();

    let mut handles = Vec::new();
    for i in 0..8u32 {
        let db = db.clone();
        let email = email.clone();
        handles.push(tokio::spawn(async move {
            let hanja = char::from_u32(0x4E00 + i).unwrap().to_string();
            db.charge_and_store(
                &email,
                QuotaKind::Ai,
                WordList::Ai,
                &record(&hanja, "2026-01-01T00:00:00.000Z"),
            )
            .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 5);
    let profile = db.get_profile(&email).await.unwrap().unwrap();
    assert_eq!(profile.ai_usage, 5);
    assert_eq!(db.list_words(&email, WordList::Ai).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_word_quota_overwrite_is_free() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email();
    db.ensure_profile(&email, small_quota()).await.unwrap();

    let first = db
        .charge_and_store(
            &email,
            QuotaKind::Words,
            WordList::Manual,
            &record("木", "2026-01-01T00:00:00.000Z"),
        )
        .await
        .unwrap();
    let second = db
        .charge_and_store(
            &email,
            QuotaKind::Words,
            WordList::Manual,
            &record("木", "2026-01-02T00:00:00.000Z"),
        )
        .await
        .unwrap();

    assert_eq!(first.used, 1);
    assert_eq!(second.used, 1);

    let stored = db
        .get_word(&email, WordList::Manual, "木")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.created_at, "2026-01-02T00:00:00.000Z");
}

// ═══════════════════════════════════════════════════════════════════════════
// WORD LIST TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_list_words_newest_first() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email();
    db.ensure_profile(&email, ProfileDefaults::default())
        .await
        .unwrap();

    for (hanja, at) in [
        ("木", "2026-01-01T00:00:00.000Z"),
        ("水", "2026-01-03T00:00:00.000Z"),
        ("火", "2026-01-02T00:00:00.000Z"),
    ] {
        db.charge_and_store(&email, QuotaKind::Words, WordList::Manual, &record(hanja, at))
            .await
            .unwrap();
    }

    let order: Vec<String> = db
        .list_words(&email, WordList::Manual)
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.hanja)
        .collect();
    assert_eq!(order, vec!["水", "火", "木"]);
}

#[tokio::test]
async fn test_remove_word_from_both_lists() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email();
    db.ensure_profile(&email, ProfileDefaults::default())
        .await
        .unwrap();

    let at = "2026-01-01T00:00:00.000Z";
    db.charge_and_store(&email, QuotaKind::Words, WordList::Manual, &record("木", at))
        .await
        .unwrap();
    db.charge_and_store(&email, QuotaKind::Ai, WordList::Ai, &record("木", at))
        .await
        .unwrap();

    assert!(db.remove_word(&email, "木").await.unwrap());
    assert!(!db.remove_word(&email, "木").await.unwrap());

    let profile = db.get_profile(&email).await.unwrap().unwrap();
    assert_eq!(profile.word_count, 0);
    // AI usage is never refunded
    assert_eq!(profile.ai_usage, 1);

    assert!(db.list_words(&email, WordList::Manual).await.unwrap().is_empty());
    assert!(db.list_words(&email, WordList::Ai).await.unwrap().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// INQUIRY AND DELETION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_add_inquiry() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email();

    let id = db
        .add_inquiry(&Inquiry {
            email: email.clone(),
            subject: "할당량".to_string(),
            message: "늘려 주세요".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            status: STATUS_RECEIVED.to_string(),
        })
        .await
        .unwrap();

    assert!(id.starts_with("1767225600000_"));
}

#[tokio::test]
async fn test_delete_user_data_removes_all_records() {
    require_emulator!();

    let db = test_db().await;
    let email = unique_email();
    db.ensure_profile(&email, ProfileDefaults::default())
        .await
        .unwrap();

    let at = "2026-01-01T00:00:00.000Z";
    for hanja in ["木", "水", "火"] {
        db.charge_and_store(&email, QuotaKind::Words, WordList::Manual, &record(hanja, at))
            .await
            .unwrap();
    }
    db.charge_and_store(&email, QuotaKind::Ai, WordList::Ai, &record("金", at))
        .await
        .unwrap();

    let deleted = db.delete_user_data(&email).await.unwrap();
    assert_eq!(deleted, 5);

    assert!(db.get_profile(&email).await.unwrap().is_none());
    assert!(db.list_words(&email, WordList::Manual).await.unwrap().is_empty());
    assert!(db.list_words(&email, WordList::Ai).await.unwrap().is_empty());

    // Deleting again is a no-op
    assert_eq!(db.delete_user_data(&email).await.unwrap(), 0);
}
