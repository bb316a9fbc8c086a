// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: the `WordStore` seam and its backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{
    Inquiry, ProfileDefaults, QuotaKind, UsageMeter, UserProfile, WordList, WordRecord,
};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// User profiles and usage counters (keyed by email)
    pub const USERS: &str = "users";
    /// Manual word list: `wordlist/{email}/wordlist/{hanja}`
    pub const WORDLIST: &str = "wordlist";
    /// AI recommendations: `ai-recommend/{email}/ai-recommend/{hanja}`
    pub const AI_RECOMMEND: &str = "ai-recommend";
    /// Support inquiries
    pub const INQUIRIES: &str = "inquiries";
}

/// Per-user document storage consumed by the services.
///
/// Every operation is keyed by the user's email. Quota-changing operations are
/// atomic with respect to concurrent sessions of the same user.
#[async_trait]
pub trait WordStore: Send + Sync {
    /// Get a user's profile.
    async fn get_profile(&self, email: &str) -> Result<Option<UserProfile>, AppError>;

    /// Create the profile with `defaults` unless it exists.
    ///
    /// Returns the stored profile and whether it was created by this call.
    async fn ensure_profile(
        &self,
        email: &str,
        defaults: ProfileDefaults,
    ) -> Result<(UserProfile, bool), AppError>;

    /// Charge one unit of `quota` and upsert `record` into `list`, atomically.
    ///
    /// Fails with `QuotaExceeded` without writing anything when the charge
    /// would pass the ceiling. Under the word quota, overwriting a character
    /// already in the list is free.
    async fn charge_and_store(
        &self,
        email: &str,
        quota: QuotaKind,
        list: WordList,
        record: &WordRecord,
    ) -> Result<UsageMeter, AppError>;

    /// Get one record by character.
    async fn get_word(
        &self,
        email: &str,
        list: WordList,
        hanja: &str,
    ) -> Result<Option<WordRecord>, AppError>;

    /// All records of one list, newest first.
    async fn list_words(&self, email: &str, list: WordList) -> Result<Vec<WordRecord>, AppError>;

    /// Delete a character from both lists.
    ///
    /// Releases one unit of the word quota if the character was in the manual
    /// list. Returns whether anything was deleted.
    async fn remove_word(&self, email: &str, hanja: &str) -> Result<bool, AppError>;

    /// Store a support inquiry, returning its document ID.
    async fn add_inquiry(&self, inquiry: &Inquiry) -> Result<String, AppError>;

    /// Delete every document belonging to a user. Returns the number deleted.
    async fn delete_user_data(&self, email: &str) -> Result<usize, AppError>;
}

/// Document ID for an inquiry: millisecond timestamp plus the filer's email.
pub(crate) fn inquiry_id(inquiry: &Inquiry) -> String {
    let millis = chrono::DateTime::parse_from_rfc3339(&inquiry.timestamp)
        .map(|t| t.timestamp_millis())
        .unwrap_or_else(|_| chrono::Utc::now().timestamp_millis());
    format!("{}_{}", millis, urlencoding::encode(&inquiry.email))
}
