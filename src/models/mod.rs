// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod inquiry;
pub mod profile;
pub mod session;
pub mod word;

pub use inquiry::Inquiry;
pub use profile::{ProfileDefaults, QuotaKind, UsageLevel, UsageMeter, UserProfile};
pub use session::UserSession;
pub use word::{WordField, WordList, WordRecord};
