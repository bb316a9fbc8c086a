// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets (Gemini API key, session signing key) are injected as environment
//! variables by the deployment and read once at startup.

use crate::models::ProfileDefaults;
use crate::services::recommend::MalformedLinePolicy;
use std::env;
use std::str::FromStr;

/// Default Gemini `generateContent` endpoint.
pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1/models/gemini-pro:generateContent";

/// Which `WordStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// Process-local store, for local development without Firestore
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// GCP / Firebase project ID (also the expected ID token audience)
    pub gcp_project_id: String,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Directory holding the static front-end bundle
    pub static_dir: String,
    /// Gemini `generateContent` endpoint
    pub gemini_api_url: String,
    /// Request timeout for the generative backend
    pub gemini_timeout_secs: u64,
    /// What to do with recommendation lines that have fewer than four fields
    pub malformed_line_policy: MalformedLinePolicy,
    /// Quotas for profiles created at first sign-in
    pub profile_defaults: ProfileDefaults,
    pub store_backend: StoreBackend,

    // --- Secrets ---
    /// Gemini API key (sent in the query string)
    pub gemini_api_key: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 10000,
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:10000".to_string(),
            static_dir: "public".to_string(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            gemini_timeout_secs: 60,
            malformed_line_policy: MalformedLinePolicy::Keep,
            profile_defaults: ProfileDefaults::default(),
            store_backend: StoreBackend::Memory,
            gemini_api_key: "test_gemini_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = ProfileDefaults::default();

        Ok(Self {
            port: parse_or("PORT", 10000)?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:10000".to_string()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
            gemini_api_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string()),
            gemini_timeout_secs: parse_or("GEMINI_TIMEOUT_SECS", 60)?,
            malformed_line_policy: parse_or("MALFORMED_LINE_POLICY", MalformedLinePolicy::Keep)?,
            profile_defaults: ProfileDefaults {
                max_word_count: parse_or("DEFAULT_MAX_WORD_COUNT", defaults.max_word_count)?,
                max_ai_usage: parse_or("DEFAULT_MAX_AI_USAGE", defaults.max_ai_usage)?,
            },
            store_backend: parse_or("STORE_BACKEND", StoreBackend::Firestore)?,

            gemini_api_key: env::var("GEMINI_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GEMINI_API_KEY"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
