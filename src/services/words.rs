// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Word list operations: manual add, delete, and search with paging.

use crate::db::WordStore;
use crate::error::{AppError, Result};
use crate::models::{QuotaKind, UsageMeter, UserSession, WordField, WordList, WordRecord};
use crate::time_utils::now_rfc3339;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Words shown per "load more" step.
pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 100;

/// A word the user enters by hand.
#[derive(Debug, Clone)]
pub struct NewWord {
    pub hanja: String,
    pub meaning: String,
    pub stroke: u32,
    pub description: String,
}

/// Search and paging parameters for a list query.
#[derive(Debug, Clone, Default)]
pub struct WordFilter {
    pub field: WordField,
    /// Case-insensitive substring; empty matches everything
    pub search: String,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// One page of a filtered list.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WordPage {
    pub words: Vec<WordRecord>,
    /// Number of words matching the filter
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

/// Filter records and cut one page out of the matches.
pub fn filter_and_page(records: Vec<WordRecord>, filter: &WordFilter) -> WordPage {
    let needle = filter.search.trim().to_lowercase();
    let limit = filter
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let matches: Vec<WordRecord> = records
        .into_iter()
        .filter(|word| {
            word.field_text(filter.field)
                .unwrap_or_default()
                .to_lowercase()
                .contains(&needle)
        })
        .collect();

    let total = matches.len();
    let words: Vec<WordRecord> = matches
        .into_iter()
        .skip(filter.offset)
        .take(limit)
        .collect();
    let has_more = filter.offset.saturating_add(words.len()) < total;

    WordPage {
        words,
        total,
        offset: filter.offset,
        limit,
        has_more,
    }
}

/// Single Unicode scalar check for the `hanja` key.
pub(crate) fn is_single_character(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some() && chars.next().is_none()
}

/// Manual word list service.
#[derive(Clone)]
pub struct WordListService {
    store: Arc<dyn WordStore>,
}

impl WordListService {
    pub fn new(store: Arc<dyn WordStore>) -> Self {
        Self { store }
    }

    /// Add a word to the manual list, charging the word quota.
    ///
    /// Re-adding a character that is already listed overwrites it for free.
    pub async fn add_word(
        &self,
        session: &UserSession,
        input: NewWord,
    ) -> Result<(WordRecord, UsageMeter)> {
        let hanja = input.hanja.trim().to_string();
        if !is_single_character(&hanja) {
            return Err(AppError::BadRequest(
                "hanja must be exactly one character".to_string(),
            ));
        }
        if input.stroke == 0 {
            return Err(AppError::BadRequest(
                "stroke must be a positive integer".to_string(),
            ));
        }

        let record = WordRecord {
            hanja,
            meaning: Some(input.meaning.trim().to_string()),
            stroke: Some(input.stroke),
            description: Some(input.description.trim().to_string()),
            created_at: now_rfc3339(),
        };

        let meter = self
            .store
            .charge_and_store(&session.email, QuotaKind::Words, WordList::Manual, &record)
            .await?;

        tracing::info!(
            email = %session.email,
            hanja = %record.hanja,
            used = meter.used,
            max = meter.max,
            "Word added"
        );

        Ok((record, meter))
    }

    /// Delete a character from both lists.
    pub async fn delete_word(&self, session: &UserSession, hanja: &str) -> Result<()> {
        if !self.store.remove_word(&session.email, hanja).await? {
            return Err(AppError::NotFound(format!("Word {} not found", hanja)));
        }

        tracing::info!(email = %session.email, hanja, "Word deleted");
        Ok(())
    }

    /// Search one of the user's lists, newest first.
    pub async fn query(
        &self,
        session: &UserSession,
        list: WordList,
        filter: &WordFilter,
    ) -> Result<WordPage> {
        let records = self.store.list_words(&session.email, list).await?;
        Ok(filter_and_page(records, filter))
    }
}
