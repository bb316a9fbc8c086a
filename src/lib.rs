// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Hanja Trainer: vocabulary lists and quota-gated AI recommendations
//!
//! This crate provides the backend API for keeping a personal list of
//! Chinese characters (Hanja) and asking a generative model for more,
//! within per-user usage quotas.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::WordStore;
use services::{FirebaseTokenVerifier, RecommendationService, WordListService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn WordStore>,
    pub recommender: RecommendationService,
    pub words: WordListService,
    pub auth_verifier: FirebaseTokenVerifier,
}
