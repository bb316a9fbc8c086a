// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hanja word record model for storage and API.

use crate::db::collections;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest description the backend is asked to write.
pub const DESCRIPTION_MAX_CHARS: usize = 10;

/// A single Hanja entry in one of a user's collections.
///
/// Stored at: `{list}/{email}/{list}/{hanja}`. Absent fields come from
/// recommendation lines that were shorter than four fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WordRecord {
    /// The character itself (also used as document ID)
    pub hanja: String,
    /// Korean gloss, "meaning + pronunciation" (e.g. "나무 목")
    #[serde(default)]
    pub meaning: Option<String>,
    /// Stroke count
    #[serde(default)]
    pub stroke: Option<u32>,
    /// Short Korean description
    #[serde(default)]
    pub description: Option<String>,
    /// When the record was written (RFC 3339)
    pub created_at: String,
}

impl WordRecord {
    /// Text of one searchable field, as the list filter sees it.
    pub fn field_text(&self, field: WordField) -> Option<String> {
        match field {
            WordField::Hanja => Some(self.hanja.clone()),
            WordField::Meaning => self.meaning.clone(),
            WordField::Stroke => self.stroke.map(|s| s.to_string()),
            WordField::Description => self.description.clone(),
        }
    }
}

/// The two disjoint per-user collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordList {
    /// Manually curated word list
    #[serde(alias = "wordlist")]
    Manual,
    /// AI-recommended list
    #[serde(alias = "ai-recommend")]
    Ai,
}

impl WordList {
    /// Collection (and sub-collection) name in Firestore.
    pub fn collection(self) -> &'static str {
        match self {
            WordList::Manual => collections::WORDLIST,
            WordList::Ai => collections::AI_RECOMMEND,
        }
    }
}

/// Field a word list search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordField {
    #[default]
    Hanja,
    Meaning,
    Stroke,
    Description,
}
