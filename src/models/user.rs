// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External identity providers supported for federated login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Github,
}

impl AuthProvider {
    /// Path segment used in `/api/auth/{provider}`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google",
            AuthProvider::Github => "github",
        }
    }

    /// Name of the user document field holding this provider's id.
    pub fn id_field(&self) -> &'static str {
        match self {
            AuthProvider::Google => "google_id",
            AuthProvider::Github => "github_id",
        }
    }
}

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUID (also used as document ID)
    pub id: String,
    /// Email address, trimmed and lowercased
    pub email: String,
    /// bcrypt hash, absent for federated-only accounts
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub github_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New password account.
    pub fn with_password(email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash: Some(password_hash),
            google_id: None,
            github_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// New account created on first federated login.
    pub fn with_provider(email: &str, provider: AuthProvider, provider_id: &str) -> Self {
        let now = Utc::now();
        let mut user = Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash: None,
            google_id: None,
            github_id: None,
            created_at: now,
            updated_at: now,
        };
        user.set_provider_id(provider, provider_id);
        user
    }

    pub fn provider_id(&self, provider: AuthProvider) -> Option<&str> {
        match provider {
            AuthProvider::Google => self.google_id.as_deref(),
            AuthProvider::Github => self.github_id.as_deref(),
        }
    }

    pub fn set_provider_id(&mut self, provider: AuthProvider, provider_id: &str) {
        let slot = match provider {
            AuthProvider::Google => &mut self.google_id,
            AuthProvider::Github => &mut self.github_id,
        };
        *slot = Some(provider_id.to_string());
        self.updated_at = Utc::now();
    }

    /// Every stored account must be able to log in somehow.
    pub fn has_login_method(&self) -> bool {
        self.password_hash.is_some() || self.google_id.is_some() || self.github_id.is_some()
    }
}

/// Canonical form used for lookups and uniqueness.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
