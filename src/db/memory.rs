// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process `WordStore` for local development and tests.
//!
//! Each user's documents live in one `DashMap` entry; holding the entry guard
//! for the whole read-modify-write makes quota charges atomic per user.

use super::{inquiry_id, WordStore};
use crate::error::AppError;
use crate::models::{
    Inquiry, ProfileDefaults, QuotaKind, UsageMeter, UserProfile, WordList, WordRecord,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct UserDocs {
    profile: Option<UserProfile>,
    manual: HashMap<String, WordRecord>,
    ai: HashMap<String, WordRecord>,
}

impl UserDocs {
    fn list(&self, list: WordList) -> &HashMap<String, WordRecord> {
        match list {
            WordList::Manual => &self.manual,
            WordList::Ai => &self.ai,
        }
    }

    fn list_mut(&mut self, list: WordList) -> &mut HashMap<String, WordRecord> {
        match list {
            WordList::Manual => &mut self.manual,
            WordList::Ai => &mut self.ai,
        }
    }
}

/// Process-local document store.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, UserDocs>,
    inquiries: DashMap<String, Inquiry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a user's profile (test setup and local seeding).
    pub fn put_profile(&self, email: &str, profile: UserProfile) {
        self.users.entry(email.to_string()).or_default().profile = Some(profile);
    }

    /// Number of stored inquiries.
    pub fn inquiry_count(&self) -> usize {
        self.inquiries.len()
    }
}

#[async_trait]
impl WordStore for MemoryStore {
    async fn get_profile(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.users.get(email).and_then(|docs| docs.profile.clone()))
    }

    async fn ensure_profile(
        &self,
        email: &str,
        defaults: ProfileDefaults,
    ) -> Result<(UserProfile, bool), AppError> {
        let mut docs = self.users.entry(email.to_string()).or_default();
        if let Some(profile) = &docs.profile {
            return Ok((profile.clone(), false));
        }

        let profile = UserProfile::new(defaults);
        docs.profile = Some(profile.clone());
        Ok((profile, true))
    }

    async fn charge_and_store(
        &self,
        email: &str,
        quota: QuotaKind,
        list: WordList,
        record: &WordRecord,
    ) -> Result<UsageMeter, AppError> {
        let mut docs = self
            .users
            .get_mut(email)
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", email)))?;

        let already_listed = docs.list(list).contains_key(&record.hanja);
        let profile = docs
            .profile
            .as_mut()
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", email)))?;

        let meter = if quota == QuotaKind::Words && already_listed {
            profile.meter(quota)
        } else {
            profile
                .charge(quota)
                .map_err(|m| AppError::QuotaExceeded {
                    used: m.used,
                    max: m.max,
                })?
        };

        docs.list_mut(list).insert(record.hanja.clone(), record.clone());

        Ok(meter)
    }

    async fn get_word(
        &self,
        email: &str,
        list: WordList,
        hanja: &str,
    ) -> Result<Option<WordRecord>, AppError> {
        Ok(self
            .users
            .get(email)
            .and_then(|docs| docs.list(list).get(hanja).cloned()))
    }

    async fn list_words(&self, email: &str, list: WordList) -> Result<Vec<WordRecord>, AppError> {
        let mut words: Vec<WordRecord> = self
            .users
            .get(email)
            .map(|docs| docs.list(list).values().cloned().collect())
            .unwrap_or_default();

        words.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.hanja.cmp(&b.hanja))
        });
        Ok(words)
    }

    async fn remove_word(&self, email: &str, hanja: &str) -> Result<bool, AppError> {
        let Some(mut docs) = self.users.get_mut(email) else {
            return Ok(false);
        };

        let from_manual = docs.manual.remove(hanja).is_some();
        let from_ai = docs.ai.remove(hanja).is_some();

        if from_manual {
            if let Some(profile) = docs.profile.as_mut() {
                profile.release_word();
            }
        }

        Ok(from_manual || from_ai)
    }

    async fn add_inquiry(&self, inquiry: &Inquiry) -> Result<String, AppError> {
        let id = inquiry_id(inquiry);
        self.inquiries.insert(id.clone(), inquiry.clone());
        Ok(id)
    }

    async fn delete_user_data(&self, email: &str) -> Result<usize, AppError> {
        let Some((_, docs)) = self.users.remove(email) else {
            return Ok(0);
        };

        let profile = usize::from(docs.profile.is_some());
        Ok(docs.manual.len() + docs.ai.len() + profile)
    }
}
