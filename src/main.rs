// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notiq API Server
//!
//! Personal notes with password and Google/GitHub login, tags, categories,
//! favorites and file attachments.

use notiq::{
    config::Config,
    db::FirestoreDb,
    services::{AttachmentStore, CloudinaryStore, DisabledStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Notiq API");

    let db = if config.use_memory_db {
        tracing::warn!("Using in-memory store; data is lost on restart");
        FirestoreDb::new_in_memory()
    } else {
        let db = FirestoreDb::new(&config.gcp_project_id).await?;
        tracing::info!(project = %config.gcp_project_id, "Connected to Firestore");
        db
    };

    let storage: Arc<dyn AttachmentStore> = match config.cloudinary.clone() {
        Some(cloudinary) => {
            tracing::info!(cloud = %cloudinary.cloud_name, "Cloudinary uploads enabled");
            Arc::new(CloudinaryStore::new(cloudinary))
        }
        None => {
            tracing::warn!("Cloudinary not configured; attachment uploads will fail");
            Arc::new(DisabledStore)
        }
    };

    let state = AppState::new(config.clone(), db, storage);
    tracing::info!(
        google = state.google.is_some(),
        github = state.github.is_some(),
        "OAuth providers"
    );

    // Build router
    let app = notiq::routes::create_router(Arc::new(state));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notiq=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
