// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and usage quota model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Per-user profile stored in Firestore.
///
/// Stored at: `users/{email}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Words currently in the manual word list
    #[serde(default)]
    pub word_count: u32,
    /// AI recommendations accepted so far
    #[serde(default)]
    pub ai_usage: u32,
    /// Ceiling for `word_count`
    #[serde(default)]
    pub max_word_count: u32,
    /// Ceiling for `ai_usage`
    #[serde(default)]
    pub max_ai_usage: u32,
}

/// Quotas applied to a profile created at first sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub max_word_count: u32,
    pub max_ai_usage: u32,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            max_word_count: 50,
            max_ai_usage: 10,
        }
    }
}

impl UserProfile {
    /// Fresh profile with zeroed counters.
    pub fn new(defaults: ProfileDefaults) -> Self {
        Self {
            word_count: 0,
            ai_usage: 0,
            max_word_count: defaults.max_word_count,
            max_ai_usage: defaults.max_ai_usage,
        }
    }

    /// Current usage meter for one quota.
    pub fn meter(&self, quota: QuotaKind) -> UsageMeter {
        match quota {
            QuotaKind::Words => UsageMeter::new(self.word_count, self.max_word_count),
            QuotaKind::Ai => UsageMeter::new(self.ai_usage, self.max_ai_usage),
        }
    }

    /// Consume one unit of `quota`.
    ///
    /// Leaves the profile untouched and returns `Err` with the current meter
    /// when the increment would pass the ceiling.
    pub fn charge(&mut self, quota: QuotaKind) -> Result<UsageMeter, UsageMeter> {
        let (used, max) = match quota {
            QuotaKind::Words => (&mut self.word_count, self.max_word_count),
            QuotaKind::Ai => (&mut self.ai_usage, self.max_ai_usage),
        };

        let next = used.saturating_add(1);
        if next > max {
            return Err(UsageMeter::new(*used, max));
        }

        *used = next;
        Ok(UsageMeter::new(next, max))
    }

    /// Give back one unit of the word quota (never below zero).
    pub fn release_word(&mut self) {
        self.word_count = self.word_count.saturating_sub(1);
    }
}

/// Which counter a write is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    /// `wordCount` / `maxWordCount`
    Words,
    /// `aiUsage` / `maxAiUsage`
    Ai,
}

/// Severity bucket used to color the usage bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

const WARNING_PERCENT: u32 = 70;
const CRITICAL_PERCENT: u32 = 90;

/// Snapshot of one quota counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsageMeter {
    pub used: u32,
    pub max: u32,
    /// Percentage of the quota consumed, capped at 100
    pub percent: u32,
    pub level: UsageLevel,
}

impl UsageMeter {
    pub fn new(used: u32, max: u32) -> Self {
        let percent = if max > 0 {
            ((u64::from(used) * 100) / u64::from(max)).min(100) as u32
        } else {
            0
        };

        let level = if percent >= CRITICAL_PERCENT {
            UsageLevel::Critical
        } else if percent >= WARNING_PERCENT {
            UsageLevel::Warning
        } else {
            UsageLevel::Normal
        };

        Self {
            used,
            max,
            percent,
            level,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }
}
