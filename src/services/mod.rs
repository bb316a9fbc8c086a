// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod firebase_auth;
pub mod gemini;
pub mod recommend;
pub mod words;

pub use firebase_auth::{FirebaseTokenVerifier, IdTokenError, VerifiedIdentity};
pub use gemini::{GeminiClient, TextGenerator};
pub use recommend::{BatchOutcome, MalformedLinePolicy, RecommendationService};
pub use words::{NewWord, WordFilter, WordListService, WordPage};
