// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, email and provider lookups)
//! - Notes (owner-scoped listing, writes, hard deletes)

use crate::db::collections;
use crate::db::memory::MemoryStore;
use crate::error::AppError;
use crate::models::{AuthProvider, Note, User};
use firestore::errors::FirestoreError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A user attribute that at most one account may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKey<'a> {
    Email(&'a str),
    Provider(AuthProvider, &'a str),
}

impl UserKey<'_> {
    fn collection(&self) -> &'static str {
        match self {
            UserKey::Email(_) => collections::USER_EMAILS,
            UserKey::Provider(AuthProvider::Google, _) => collections::USER_GOOGLE_IDS,
            UserKey::Provider(AuthProvider::Github, _) => collections::USER_GITHUB_IDS,
        }
    }

    /// Document ID for the claim. Escaped so values containing `/` stay one segment.
    fn document_id(&self) -> String {
        let value = match self {
            UserKey::Email(email) => email,
            UserKey::Provider(_, id) => id,
        };
        urlencoding::encode(value).into_owned()
    }
}

/// Claim document: who holds the value.
#[derive(Debug, Serialize, Deserialize)]
struct UserKeyClaim {
    user_id: String,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

/// Document database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-process database (tests and local runs).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Memory(store) => Ok(store.get_user(user_id)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
        }
    }

    /// Find a user by normalized email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Memory(store) => Ok(store.find_user_by_email(email)),
            Backend::Firestore(client) => {
                let users: Vec<User> = client
                    .fluent()
                    .select()
                    .from(collections::USERS)
                    .filter(|q| q.field("email").eq(email))
                    .limit(1)
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(users.into_iter().next())
            }
        }
    }

    /// Find a user by their external identity provider ID.
    pub async fn find_user_by_provider(
        &self,
        provider: AuthProvider,
        provider_id: &str,
    ) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Memory(store) => Ok(store.find_user_by_provider(provider, provider_id)),
            Backend::Firestore(client) => {
                let users: Vec<User> = client
                    .fluent()
                    .select()
                    .from(collections::USERS)
                    .filter(|q| q.field(provider.id_field()).eq(provider_id))
                    .limit(1)
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(users.into_iter().next())
            }
        }
    }

    /// Create or update a user.
    ///
    /// Does not check uniqueness; new values must be claimed first with
    /// [`claim_user_key`](Self::claim_user_key).
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        if !user.has_login_method() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Refusing to store user {} without a login method",
                user.id
            )));
        }

        match &self.backend {
            Backend::Memory(store) => {
                store.upsert_user(user);
                Ok(())
            }
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(&user.id)
                    .object(user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
        }
    }

    /// Reserve a unique value for `user_id`.
    ///
    /// Returns `false` if another user already holds it. Claiming a value the
    /// same user already holds succeeds.
    pub async fn claim_user_key(
        &self,
        key: UserKey<'_>,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let collection = key.collection();
        let doc_id = key.document_id();

        match &self.backend {
            Backend::Memory(store) => Ok(store.claim_user_key(collection, &doc_id, user_id)),
            Backend::Firestore(client) => {
                let claim = UserKeyClaim {
                    user_id: user_id.to_string(),
                };
                let created: Result<UserKeyClaim, FirestoreError> = client
                    .fluent()
                    .insert()
                    .into(collection)
                    .document_id(&doc_id)
                    .object(&claim)
                    .execute()
                    .await;

                match created {
                    Ok(_) => Ok(true),
                    Err(FirestoreError::DataConflictError(_)) => {
                        let holder: Option<UserKeyClaim> = client
                            .fluent()
                            .select()
                            .by_id_in(collection)
                            .obj()
                            .one(&doc_id)
                            .await
                            .map_err(|e| AppError::Database(e.to_string()))?;
                        Ok(holder.is_some_and(|h| h.user_id == user_id))
                    }
                    Err(e) => Err(AppError::Database(e.to_string())),
                }
            }
        }
    }

    /// Drop a claim made by `user_id`. Claims held by other users are kept.
    pub async fn release_user_key(
        &self,
        key: UserKey<'_>,
        user_id: &str,
    ) -> Result<(), AppError> {
        let collection = key.collection();
        let doc_id = key.document_id();

        match &self.backend {
            Backend::Memory(store) => {
                store.release_user_key(collection, &doc_id, user_id);
                Ok(())
            }
            Backend::Firestore(client) => {
                let holder: Option<UserKeyClaim> = client
                    .fluent()
                    .select()
                    .by_id_in(collection)
                    .obj()
                    .one(&doc_id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                if holder.is_some_and(|h| h.user_id == user_id) {
                    client
                        .fluent()
                        .delete()
                        .from(collection)
                        .document_id(&doc_id)
                        .execute()
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }
                Ok(())
            }
        }
    }

    // ─── Note Operations ─────────────────────────────────────────

    /// Get a note by ID, regardless of owner.
    pub async fn get_note(&self, note_id: &str) -> Result<Option<Note>, AppError> {
        match &self.backend {
            Backend::Memory(store) => Ok(store.get_note(note_id)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::NOTES)
                .obj()
                .one(note_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
        }
    }

    /// All notes owned by a user, newest first.
    pub async fn list_notes_for_user(&self, user_id: &str) -> Result<Vec<Note>, AppError> {
        let mut notes: Vec<Note> = match &self.backend {
            Backend::Memory(store) => store.notes_for_user(user_id),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::NOTES)
                .filter(|q| q.field("user").eq(user_id))
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        };

        // Timestamps are stored as RFC3339 strings with variable precision,
        // so order on the parsed values rather than in the query.
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(notes)
    }

    /// Create or overwrite a note.
    pub async fn set_note(&self, note: &Note) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(store) => {
                store.set_note(note);
                Ok(())
            }
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::NOTES)
                    .document_id(&note.id)
                    .object(note)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
        }
    }

    /// Permanently delete a note.
    pub async fn delete_note(&self, note_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(store) => {
                store.delete_note(note_id);
                Ok(())
            }
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::NOTES)
                    .document_id(note_id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(())
            }
        }
    }
}
