// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quota-gated AI recommendation service.
//!
//! Asks the generative backend for Hanja on a topic, parses the
//! pipe-delimited reply into `WordRecord`s, and stores each record only if
//! the user's AI quota allows it.

use crate::db::WordStore;
use crate::error::{AppError, Result};
use crate::models::word::DESCRIPTION_MAX_CHARS;
use crate::models::{QuotaKind, UsageMeter, UserSession, WordList, WordRecord};
use crate::services::gemini::TextGenerator;
use crate::services::words::is_single_character;
use crate::time_utils::now_rfc3339;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Largest number of characters one request may ask for.
pub const MAX_RECOMMEND_COUNT: u32 = 50;

const FIELD_DELIMITER: char = '|';
const FIELDS_PER_LINE: usize = 4;

/// What to do with a reply line that has fewer than four fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLinePolicy {
    /// Keep the record with the missing fields absent
    #[default]
    Keep,
    /// Skip the line
    Drop,
    /// Fail the whole recommendation with a backend error
    Reject,
}

impl FromStr for MalformedLinePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(MalformedLinePolicy::Keep),
            "drop" => Ok(MalformedLinePolicy::Drop),
            "reject" => Ok(MalformedLinePolicy::Reject),
            other => Err(format!("unknown malformed line policy: {}", other)),
        }
    }
}

impl fmt::Display for MalformedLinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MalformedLinePolicy::Keep => "keep",
            MalformedLinePolicy::Drop => "drop",
            MalformedLinePolicy::Reject => "reject",
        };
        f.write_str(name)
    }
}

/// Result of a recommend-and-persist batch.
///
/// Accepted records stay stored even when later records hit the quota.
#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BatchOutcome {
    /// Records stored
    pub accepted: u32,
    /// Records refused by the AI quota
    pub rejected: u32,
    /// The stored records, in reply order
    pub words: Vec<WordRecord>,
    /// AI quota after the batch (absent if nothing was attempted)
    pub usage: Option<UsageMeter>,
}

impl BatchOutcome {
    /// Returns true if every recommended record was stored.
    pub fn is_complete_success(&self) -> bool {
        self.rejected == 0
    }

    /// Returns true if the quota refused every record.
    pub fn is_complete_failure(&self) -> bool {
        self.accepted == 0 && self.rejected > 0
    }
}

/// Build the instruction sent to the generative backend.
pub fn build_prompt(topic: &str, count: u32) -> String {
    format!(
        "Recommend {count} Chinese characters (Hanja) related to the following topic: {topic}.\n\
         Follow this exact format for each character:\n\
         \n\
         Hanja|Korean Pronunciation|Stroke Count|Description (in Korean, max {DESCRIPTION_MAX_CHARS} characters)\n\
         \n\
         ### Important Rules:\n\
         1. The Korean pronunciation must strictly follow the format \"meaning + pronunciation\" (e.g. \"나무 목\", \"물 수\").\n\
         2. Each entry must contain exactly one Hanja character (no two-character words).\n\
         3. The stroke count must match the standard stroke order exactly.\n\
         4. The description and pronunciation must be written in Korean.\n\
         5. Put exactly one entry on each line and nothing else.\n\
         \n\
         Example Response:\n\
         木|나무 목|4|식물 관련\n\
         水|물 수|4|강이나 바다\n\
         火|불 화|4|뜨거운 것\n",
        count = count,
        topic = topic.trim(),
    )
}

/// Parse the leading decimal digits of a field, ignoring any suffix ("4획").
///
/// Zero and non-numeric fields parse to `None`.
pub fn parse_stroke(field: &str) -> Option<u32> {
    let digits: String = field
        .trim()
        .trim_start_matches('+')
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().ok().filter(|&n| n > 0)
}

/// Parse a backend reply into word records.
///
/// Blank lines, lines without a `|`, and lines whose first field is not
/// exactly one character are ignored (`Reject` fails on the latter). Fields
/// are trimmed; fields past the fourth are ignored. Lines with fewer than four
/// fields are handled according to `policy`.
pub fn parse_recommendations(
    text: &str,
    policy: MalformedLinePolicy,
    created_at: &str,
) -> Result<Vec<WordRecord>> {
    let mut records = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() || !line.contains(FIELD_DELIMITER) {
            continue;
        }

        let fields: Vec<&str> = line.split(FIELD_DELIMITER).map(str::trim).collect();
        let hanja = fields[0];
        if hanja.is_empty() {
            tracing::debug!(line, "Skipping recommendation line without a character");
            continue;
        }

        // The character is the document key, so it can never be kept as-is
        if !is_single_character(hanja) {
            if policy == MalformedLinePolicy::Reject {
                return Err(AppError::Backend(format!(
                    "Recommendation line is not a single character: {:?}",
                    line
                )));
            }
            tracing::debug!(line, "Skipping recommendation line with a bad character key");
            continue;
        }

        if fields.len() < FIELDS_PER_LINE {
            match policy {
                MalformedLinePolicy::Keep => {}
                MalformedLinePolicy::Drop => {
                    tracing::debug!(line, "Dropping malformed recommendation line");
                    continue;
                }
                MalformedLinePolicy::Reject => {
                    return Err(AppError::Backend(format!(
                        "Malformed recommendation line: {:?}",
                        line
                    )));
                }
            }
        }

        let field = |i: usize| fields.get(i).map(|s| s.to_string());

        records.push(WordRecord {
            hanja: hanja.to_string(),
            meaning: field(1),
            stroke: fields.get(2).and_then(|s| parse_stroke(s)),
            description: field(3),
            created_at: created_at.to_string(),
        });
    }

    if records.is_empty() {
        return Err(AppError::EmptyResult);
    }

    Ok(records)
}

/// Check a topic and count before any backend call.
pub fn validate_request(topic: &str, count: u32) -> Result<()> {
    if topic.trim().is_empty() {
        return Err(AppError::BadRequest("Topic must not be empty".to_string()));
    }
    if count == 0 || count > MAX_RECOMMEND_COUNT {
        return Err(AppError::BadRequest(format!(
            "Count must be between 1 and {}",
            MAX_RECOMMEND_COUNT
        )));
    }
    Ok(())
}

/// Recommendation workflow over a text backend and a word store.
#[derive(Clone)]
pub struct RecommendationService {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn WordStore>,
    policy: MalformedLinePolicy,
}

impl RecommendationService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn WordStore>,
        policy: MalformedLinePolicy,
    ) -> Self {
        Self {
            generator,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> MalformedLinePolicy {
        self.policy
    }

    /// Ask the backend for `count` characters on `topic` and parse the reply.
    ///
    /// One call, no retry.
    pub async fn recommend(&self, topic: &str, count: u32) -> Result<Vec<WordRecord>> {
        validate_request(topic, count)?;

        let prompt = build_prompt(topic, count);
        let text = self.generator.generate(&prompt).await?;
        let records = parse_recommendations(&text, self.policy, &now_rfc3339())?;

        tracing::info!(
            topic = topic.trim(),
            requested = count,
            parsed = records.len(),
            "Recommendations received"
        );

        Ok(records)
    }

    /// Charge one unit of the AI quota and store the record.
    ///
    /// Both happen atomically in the store; on `QuotaExceeded` nothing is
    /// written.
    pub async fn accept_and_persist(
        &self,
        session: &UserSession,
        record: &WordRecord,
    ) -> Result<UsageMeter> {
        self.store
            .charge_and_store(&session.email, QuotaKind::Ai, WordList::Ai, record)
            .await
    }

    /// Recommend, then try to persist every record in turn.
    ///
    /// An exhausted AI quota fails with `QuotaExceeded` before the backend is
    /// called. A per-record `QuotaExceeded` counts as rejected and the loop
    /// goes on; any other error stops the batch.
    pub async fn recommend_and_persist_batch(
        &self,
        session: &UserSession,
        topic: &str,
        count: u32,
    ) -> Result<BatchOutcome> {
        validate_request(topic, count)?;

        let profile = self
            .store
            .get_profile(&session.email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", session.email)))?;
        let meter = profile.meter(QuotaKind::Ai);
        if meter.remaining() == 0 {
            tracing::info!(
                email = %session.email,
                used = meter.used,
                max = meter.max,
                "AI quota exhausted, skipping backend call"
            );
            return Err(AppError::QuotaExceeded {
                used: meter.used,
                max: meter.max,
            });
        }

        let records = self.recommend(topic, count).await?;
        let mut outcome = BatchOutcome::default();

        for record in records {
            match self.accept_and_persist(session, &record).await {
                Ok(meter) => {
                    outcome.accepted += 1;
                    outcome.usage = Some(meter);
                    outcome.words.push(record);
                }
                Err(AppError::QuotaExceeded { used, max }) => {
                    outcome.rejected += 1;
                    outcome.usage = Some(UsageMeter::new(used, max));
                }
                Err(e) => return Err(e),
            }
        }

        if outcome.is_complete_success() {
            tracing::info!(
                email = %session.email,
                accepted = outcome.accepted,
                "Recommendation batch stored"
            );
        } else {
            tracing::warn!(
                email = %session.email,
                accepted = outcome.accepted,
                rejected = outcome.rejected,
                "Recommendation batch hit the AI quota"
            );
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT: &str = "2026-01-01T00:00:00.000Z";

    #[test]
    fn test_parses_well_formed_lines() {
        let text = "木|나무 목|4|식물 관련\n 水 | 물 수 | 4 | 강이나 바다 \n火|불 화|4|뜨거운 것";
        let records = parse_recommendations(text, MalformedLinePolicy::Keep, AT).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].hanja, "水");
        assert_eq!(records[1].meaning.as_deref(), Some("물 수"));
        assert_eq!(records[1].stroke, Some(4));
        assert_eq!(records[1].description.as_deref(), Some("강이나 바다"));
        assert!(records.iter().all(|r| r.created_at == AT));
    }

    #[test]
    fn test_skips_noise_lines() {
        let text = "Here are your characters:\n\n木|나무 목|4|식물\r\n   \n|빈 글자|3|x\n";
        let records = parse_recommendations(text, MalformedLinePolicy::Keep, AT).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description.as_deref(), Some("식물"));
    }

    #[test]
    fn test_no_usable_lines_is_empty_result() {
        for text in ["", "\n\n", "no delimiters here\nnor here"] {
            let err = parse_recommendations(text, MalformedLinePolicy::Keep, AT).unwrap_err();
            assert!(matches!(err, AppError::EmptyResult), "text: {:?}", text);
        }
    }

    #[test]
    fn test_short_line_keep_policy() {
        let records =
            parse_recommendations("木|나무 목", MalformedLinePolicy::Keep, AT).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].meaning.as_deref(), Some("나무 목"));
        assert_eq!(records[0].stroke, None);
        assert_eq!(records[0].description, None);
    }

    #[test]
    fn test_short_line_drop_policy() {
        let text = "木|나무 목\n水|물 수|4|강";
        let records = parse_recommendations(text, MalformedLinePolicy::Drop, AT).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hanja, "水");

        let err = parse_recommendations("木|나무 목", MalformedLinePolicy::Drop, AT).unwrap_err();
        assert!(matches!(err, AppError::EmptyResult));
    }

    #[test]
    fn test_short_line_reject_policy() {
        let text = "水|물 수|4|강\n木|나무 목";
        let err = parse_recommendations(text, MalformedLinePolicy::Reject, AT).unwrap_err();
        assert!(matches!(err, AppError::Backend(_)));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let records =
            parse_recommendations("木|나무 목|4|식물|extra", MalformedLinePolicy::Reject, AT)
                .unwrap();
        assert_eq!(records[0].description.as_deref(), Some("식물"));
    }

    #[test]
    fn test_parse_stroke() {
        assert_eq!(parse_stroke("4"), Some(4));
        assert_eq!(parse_stroke(" 12 "), Some(12));
        assert_eq!(parse_stroke("4획"), Some(4));
        assert_eq!(parse_stroke("+7"), Some(7));
        assert_eq!(parse_stroke("four"), None);
        assert_eq!(parse_stroke("-3"), None);
        assert_eq!(parse_stroke("0"), None);
        assert_eq!(parse_stroke(""), None);
    }

    #[test]
    fn test_skips_lines_without_single_character_key() {
        let text = "1. 木|나무 목|4|식물\n木水|나무와 물|8|두 글자\na/b|x|1|y\n火|불 화|4|뜨거운 것";

        for policy in [MalformedLinePolicy::Keep, MalformedLinePolicy::Drop] {
            let records = parse_recommendations(text, policy, AT).unwrap();
            let keys: Vec<&str> = records.iter().map(|r| r.hanja.as_str()).collect();
            assert_eq!(keys, vec!["火"], "{policy}");
        }
    }

    #[test]
    fn test_slash_key_never_reaches_store() {
        let err = parse_recommendations("a/b|x|1|y", MalformedLinePolicy::Keep, AT).unwrap_err();
        assert!(matches!(err, AppError::EmptyResult));

        let err =
            parse_recommendations("a/b|x|1|y\n木|나무 목|4|식물", MalformedLinePolicy::Reject, AT)
                .unwrap_err();
        assert!(matches!(err, AppError::Backend(_)));
    }

    #[test]
    fn test_prompt_mentions_count_and_topic() {
        let prompt = build_prompt("  nature ", 5);
        assert!(prompt.starts_with("Recommend 5 Chinese characters"));
        assert!(prompt.contains("topic: nature."));
        assert!(prompt.contains("Hanja|Korean Pronunciation|Stroke Count|Description"));
    }

    #[test]
    fn test_validate_request() {
        assert!(validate_request("nature", 1).is_ok());
        assert!(validate_request("nature", 50).is_ok());
        assert!(validate_request("nature", 0).is_err());
        assert!(validate_request("nature", 51).is_err());
        assert!(validate_request("   ", 5).is_err());
    }

    #[test]
    fn test_policy_parse_and_display() {
        for policy in [
            MalformedLinePolicy::Keep,
            MalformedLinePolicy::Drop,
            MalformedLinePolicy::Reject,
        ] {
            assert_eq!(policy.to_string().parse::<MalformedLinePolicy>(), Ok(policy));
        }
        assert!("ignore".parse::<MalformedLinePolicy>().is_err());
    }
}
