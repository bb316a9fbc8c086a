// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hanja Trainer API Server
//!
//! Serves the word list and recommendation API together with the static
//! front-end bundle.

use hanja_trainer::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryStore, WordStore},
    services::{FirebaseTokenVerifier, GeminiClient, RecommendationService, WordListService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        store = ?config.store_backend,
        malformed_line_policy = %config.malformed_line_policy,
        "Starting Hanja Trainer API"
    );

    let store: Arc<dyn WordStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let generator = Arc::new(GeminiClient::from_config(&config)?);
    let recommender =
        RecommendationService::new(generator, store.clone(), config.malformed_line_policy);
    let words = WordListService::new(store.clone());

    let auth_verifier = FirebaseTokenVerifier::new(&config)?;

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        recommender,
        words,
        auth_verifier,
    });

    // Build router
    let app = hanja_trainer::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hanja_trainer=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
