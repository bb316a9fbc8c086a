// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use hanja_trainer::config::Config;
use hanja_trainer::db::{FirestoreDb, MemoryStore, WordStore};
use hanja_trainer::error::AppError;
use hanja_trainer::middleware::auth::create_jwt;
use hanja_trainer::models::{ProfileDefaults, UserProfile};
use hanja_trainer::routes::create_router;
use hanja_trainer::services::{
    FirebaseTokenVerifier, RecommendationService, TextGenerator, WordListService,
};
use hanja_trainer::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

#[allow(dead_code)]
pub const TEST_EMAIL: &str = "student@example.com";

/// Key ID of the static RSA key the test verifier trusts.
#[allow(dead_code)]
pub const TEST_KID: &str = "test-kid";

const TEST_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/firebase_test_key.pem");
const TEST_PUBLIC_KEY: &[u8] = include_bytes!("../fixtures/firebase_test_key.pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Unique email per test for isolation in a shared emulator.
#[allow(dead_code)]
pub fn unique_email() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-{nanos}@example.com")
}

/// Generative backend that returns a canned reply and counts calls.
pub struct StubGenerator {
    reply: Mutex<Result<String, String>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Mutex::new(Ok(reply.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Mutex::new(Err(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = Ok(reply.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .lock()
            .unwrap()
            .clone()
            .map_err(AppError::Backend)
    }
}

/// Handles to the pieces behind a test router.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<StubGenerator>,
}

#[allow(dead_code)]
impl TestApp {
    /// Session token for `email`, signed with the app's key.
    pub fn token_for(&self, email: &str) -> String {
        create_jwt(email, &self.state.config.jwt_signing_key).unwrap()
    }

    /// Give `email` a profile with the given usage.
    pub fn seed_profile(&self, email: &str, profile: UserProfile) {
        self.store.put_profile(email, profile);
    }

    /// Give `email` a fresh profile with default quotas.
    pub fn seed_default_profile(&self, email: &str) {
        self.store
            .put_profile(email, UserProfile::new(ProfileDefaults::default()));
    }
}

/// Config pointing the static fallback at the test fixtures.
#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::test_default();
    config.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/public").to_string();
    config
}

/// Create a test app with an in-memory store and a stub generator.
#[allow(dead_code)]
pub fn create_test_app(reply: &str) -> TestApp {
    create_test_app_with(test_config(), StubGenerator::new(reply))
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config, generator: StubGenerator) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(generator);

    let dyn_store: Arc<dyn WordStore> = store.clone();
    let recommender = RecommendationService::new(
        generator.clone(),
        dyn_store.clone(),
        config.malformed_line_policy,
    );
    let words = WordListService::new(dyn_store.clone());

    let public_key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY).unwrap();
    let auth_verifier =
        FirebaseTokenVerifier::new_with_static_key(&config, TEST_KID, public_key).unwrap();

    let state = Arc::new(AppState {
        config,
        store: dyn_store,
        recommender,
        words,
        auth_verifier,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        generator,
    }
}

#[allow(dead_code)]
#[derive(Serialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub firebase: FirebaseClaim,
}

#[derive(Serialize)]
pub struct FirebaseClaim {
    pub sign_in_provider: String,
}

#[allow(dead_code)]
impl IdTokenClaims {
    /// Claims Firebase would issue for a verified Google account.
    pub fn valid(config: &Config, email: &str) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        Self {
            iss: format!("https://securetoken.google.com/{}", config.gcp_project_id),
            aud: config.gcp_project_id.clone(),
            sub: "firebase-uid-123".to_string(),
            iat: now,
            exp: now + 3600,
            email: Some(email.to_string()),
            email_verified: Some(true),
            firebase: FirebaseClaim {
                sign_in_provider: "google.com".to_string(),
            },
        }
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Sign ID token claims with the test RSA key.
#[allow(dead_code)]
pub fn sign_id_token(claims: &IdTokenClaims, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(
        &header,
        claims,
        &EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY).unwrap(),
    )
    .unwrap()
}
