// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and usage counters)
//! - Word lists (`wordlist/{email}/wordlist/{hanja}`)
//! - AI recommendations (`ai-recommend/{email}/ai-recommend/{hanja}`)
//! - Inquiries

use super::{collections, inquiry_id, WordStore};
use crate::error::AppError;
use crate::models::{
    Inquiry, ProfileDefaults, QuotaKind, UsageMeter, UserProfile, WordList, WordRecord,
};
use async_trait::async_trait;
use firestore::errors::{BackoffError, FirestoreError};
use futures_util::future::try_join;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Result of the quota transaction, mapped to `AppError` after commit.
enum ChargeOutcome {
    Charged(UsageMeter),
    Rejected(UsageMeter),
    MissingProfile,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
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

    /// Create a mock Firestore client for testing (offline mode).
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

    /// Delete word documents in chunks, one transaction per chunk.
    async fn batch_delete_words(
        &self,
        email: &str,
        list: WordList,
        records: &[WordRecord],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(list.collection(), email)
            .map_err(|e| AppError::Database(e.to_string()))?;

        for chunk in records.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for record in chunk {
                client
                    .fluent()
                    .delete()
                    .from(list.collection())
                    .document_id(&record.hanja)
                    .parent(&parent_path)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            list.collection(),
                            e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    /// Delete one list's records and its parent document. Returns the record count.
    async fn delete_list(&self, email: &str, list: WordList) -> Result<usize, AppError> {
        let records = self.list_words(email, list).await?;
        self.batch_delete_words(email, list, &records).await?;

        self.get_client()?
            .fluent()
            .delete()
            .from(list.collection())
            .document_id(email)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(
            email,
            collection = list.collection(),
            count = records.len(),
            "Deleted word records"
        );
        Ok(records.len())
    }
}

#[async_trait]
impl WordStore for FirestoreDb {
    // ─── Profile Operations ──────────────────────────────────────

    async fn get_profile(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(email)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn ensure_profile(
        &self,
        email: &str,
        defaults: ProfileDefaults,
    ) -> Result<(UserProfile, bool), AppError> {
        let email = email.to_string();

        self.get_client()?
            .run_transaction(|db, transaction| {
                let email = email.clone();
                Box::pin(async move {
                    let existing: Option<UserProfile> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&email)
                        .await?;

                    if let Some(profile) = existing {
                        return Ok((profile, false));
                    }

                    let profile = UserProfile::new(defaults);
                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&email)
                        .object(&profile)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>((profile, true))
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Profile transaction failed: {}", e)))
    }

    // ─── Atomic Quota Charge ─────────────────────────────────────

    /// Charge the quota and upsert the record in one Firestore transaction.
    ///
    /// The profile is read inside the transaction, so a concurrent charge from
    /// another session makes Firestore retry with fresh data instead of losing
    /// an update. A rejected charge adds no writes.
    async fn charge_and_store(
        &self,
        email: &str,
        quota: QuotaKind,
        list: WordList,
        record: &WordRecord,
    ) -> Result<UsageMeter, AppError> {
        let email = email.to_string();
        let record = record.clone();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let email = email.clone();
                let record = record.clone();
                Box::pin(async move {
                    let profile: Option<UserProfile> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&email)
                        .await?;

                    let Some(mut profile) = profile else {
                        return Ok(ChargeOutcome::MissingProfile);
                    };

                    let parent_path = db.parent_path(list.collection(), &email)?;
                    let existing: Option<WordRecord> = db
                        .fluent()
                        .select()
                        .by_id_in(list.collection())
                        .parent(&parent_path)
                        .obj()
                        .one(&record.hanja)
                        .await?;

                    let meter = if quota == QuotaKind::Words && existing.is_some() {
                        profile.meter(quota)
                    } else {
                        match profile.charge(quota) {
                            Ok(meter) => {
                                db.fluent()
                                    .update()
                                    .in_col(collections::USERS)
                                    .document_id(&email)
                                    .object(&profile)
                                    .add_to_transaction(transaction)?;
                                meter
                            }
                            Err(meter) => return Ok(ChargeOutcome::Rejected(meter)),
                        }
                    };

                    db.fluent()
                        .update()
                        .in_col(list.collection())
                        .document_id(&record.hanja)
                        .parent(&parent_path)
                        .object(&record)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(ChargeOutcome::Charged(meter))
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Quota transaction failed: {}", e)))?;

        match outcome {
            ChargeOutcome::Charged(meter) => {
                tracing::debug!(
                    email = %email,
                    hanja = %record.hanja,
                    quota = ?quota,
                    used = meter.used,
                    max = meter.max,
                    "Quota charged and record stored"
                );
                Ok(meter)
            }
            ChargeOutcome::Rejected(meter) => Err(AppError::QuotaExceeded {
                used: meter.used,
                max: meter.max,
            }),
            ChargeOutcome::MissingProfile => {
                Err(AppError::NotFound(format!("Profile {} not found", email)))
            }
        }
    }

    // ─── Word Operations ─────────────────────────────────────────

    async fn get_word(
        &self,
        email: &str,
        list: WordList,
        hanja: &str,
    ) -> Result<Option<WordRecord>, AppError> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(list.collection(), email)
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .select()
            .by_id_in(list.collection())
            .parent(&parent_path)
            .obj()
            .one(hanja)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_words(&self, email: &str, list: WordList) -> Result<Vec<WordRecord>, AppError> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(list.collection(), email)
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .select()
            .from(list.collection())
            .parent(&parent_path)
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn remove_word(&self, email: &str, hanja: &str) -> Result<bool, AppError> {
        let email = email.to_string();
        let hanja = hanja.to_string();

        self.get_client()?
            .run_transaction(|db, transaction| {
                let email = email.clone();
                let hanja = hanja.clone();
                Box::pin(async move {
                    let mut deleted = false;
                    let mut released = false;

                    for list in [WordList::Manual, WordList::Ai] {
                        let parent_path = db.parent_path(list.collection(), &email)?;
                        let existing: Option<WordRecord> = db
                            .fluent()
                            .select()
                            .by_id_in(list.collection())
                            .parent(&parent_path)
                            .obj()
                            .one(&hanja)
                            .await?;

                        if existing.is_none() {
                            continue;
                        }

                        db.fluent()
                            .delete()
                            .from(list.collection())
                            .document_id(&hanja)
                            .parent(&parent_path)
                            .add_to_transaction(transaction)?;

                        deleted = true;
                        released |= list == WordList::Manual;
                    }

                    if released {
                        let profile: Option<UserProfile> = db
                            .fluent()
                            .select()
                            .by_id_in(collections::USERS)
                            .obj()
                            .one(&email)
                            .await?;

                        if let Some(mut profile) = profile {
                            profile.release_word();
                            db.fluent()
                                .update()
                                .in_col(collections::USERS)
                                .document_id(&email)
                                .object(&profile)
                                .add_to_transaction(transaction)?;
                        }
                    }

                    Ok::<_, BackoffError<FirestoreError>>(deleted)
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Word deletion failed: {}", e)))
    }

    // ─── Inquiry Operations ──────────────────────────────────────

    async fn add_inquiry(&self, inquiry: &Inquiry) -> Result<String, AppError> {
        let id = inquiry_id(inquiry);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::INQUIRIES)
            .document_id(&id)
            .object(inquiry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(id)
    }

    // ─── User Data Deletion ──────────────────────────────────────

    /// Delete ALL data for a user.
    ///
    /// Deletes:
    /// - every document in `wordlist/{email}/wordlist`
    /// - every document in `ai-recommend/{email}/ai-recommend`
    /// - the parent documents `wordlist/{email}` and `ai-recommend/{email}`
    /// - `users/{email}`
    ///
    /// Returns the number of word and profile documents deleted.
    async fn delete_user_data(&self, email: &str) -> Result<usize, AppError> {
        let (manual, ai) = try_join(
            self.delete_list(email, WordList::Manual),
            self.delete_list(email, WordList::Ai),
        )
        .await?;
        let mut deleted_count = manual + ai;

        let had_profile = self.get_profile(email).await?.is_some();
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(email)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if had_profile {
            deleted_count += 1;
        }
        tracing::debug!(email, "Deleted user profile");

        tracing::info!(email, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }
}
