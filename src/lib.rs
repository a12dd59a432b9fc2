// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notiq: personal notes with tags, categories, favorites and attachments.
//!
//! This crate provides the backend API (accounts, note CRUD with ownership
//! checks, attachment uploads) together with the client-side pieces a
//! frontend needs: a typed HTTP client and the dashboard's derived views.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod validation;

use config::Config;
use db::FirestoreDb;
use models::AuthProvider;
use services::{AttachmentStore, OAuthClient};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub storage: Arc<dyn AttachmentStore>,
    pub google: Option<OAuthClient>,
    pub github: Option<OAuthClient>,
}

impl AppState {
    /// Build state, enabling each OAuth provider that has credentials.
    pub fn new(config: Config, db: FirestoreDb, storage: Arc<dyn AttachmentStore>) -> Self {
        let google = config
            .google
            .clone()
            .map(|creds| OAuthClient::new(AuthProvider::Google, creds));
        let github = config
            .github
            .clone()
            .map(|creds| OAuthClient::new(AuthProvider::Github, creds));

        Self {
            config,
            db,
            storage,
            google,
            github,
        }
    }

    pub fn oauth_client(&self, provider: AuthProvider) -> Option<&OAuthClient> {
        match provider {
            AuthProvider::Google => self.google.as_ref(),
            AuthProvider::Github => self.github.as_ref(),
        }
    }
}
