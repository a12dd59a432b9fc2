// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. OAuth providers and the
//! object store are optional; when their credentials are missing the
//! corresponding routes report that the feature is not configured.

use std::env;

/// Default frontend used for OAuth redirects and CORS.
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Default folder for uploaded attachments in the object store.
pub const DEFAULT_UPLOAD_FOLDER: &str = "notiq-notes";

/// OAuth client credentials for one identity provider.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Cloudinary upload credentials.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for OAuth redirects
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Folder attachments are uploaded into
    pub upload_folder: String,
    /// Use the in-process store instead of Firestore
    pub use_memory_db: bool,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
    pub google: Option<OAuthCredentials>,
    pub github: Option<OAuthCredentials>,
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 3000,
            upload_folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            use_memory_db: true,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
            google: Some(OAuthCredentials {
                client_id: "google_test_id".to_string(),
                client_secret: "google_test_secret".to_string(),
            }),
            github: None,
            cloudinary: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?;
        if jwt_signing_key.is_empty() {
            return Err(ConfigError::Missing("JWT_SIGNING_KEY"));
        }

        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(|v| v.trim().to_string())
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| jwt_signing_key.clone());

        let frontend_url = env::var("FRONTEND_URL")
            .or_else(|_| env::var("CLIENT_URL"))
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string());

        Ok(Self {
            frontend_url,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            upload_folder: env::var("UPLOAD_FOLDER")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_FOLDER.to_string()),
            use_memory_db: env::var("USE_MEMORY_DB").is_ok(),
            jwt_signing_key: jwt_signing_key.into_bytes(),
            oauth_state_key: oauth_state_key.into_bytes(),
            google: oauth_credentials("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            github: oauth_credentials("GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
            cloudinary: cloudinary_config(),
        })
    }
}

/// Read an optional secret, treating blank values as absent.
fn optional_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A provider is enabled only when both its id and secret are present.
fn oauth_credentials(id_var: &str, secret_var: &str) -> Option<OAuthCredentials> {
    match (optional_secret(id_var), optional_secret(secret_var)) {
        (Some(client_id), Some(client_secret)) => Some(OAuthCredentials {
            client_id,
            client_secret,
        }),
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!(
                id_var,
                secret_var,
                "Partial OAuth credentials, provider disabled"
            );
            None
        }
        (None, None) => None,
    }
}

fn cloudinary_config() -> Option<CloudinaryConfig> {
    Some(CloudinaryConfig {
        cloud_name: optional_secret("CLOUDINARY_CLOUD_NAME")?,
        api_key: optional_secret("CLOUDINARY_API_KEY")?,
        api_secret: optional_secret("CLOUDINARY_API_SECRET")?,
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
