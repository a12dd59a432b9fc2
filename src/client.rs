// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed HTTP client for the notes API.
//!
//! Used by Rust frontends and tooling. Note CRUD is exposed through the
//! [`NotesApi`] trait so [`crate::dashboard::NoteBoard`] can drive either
//! this client or a test double.

use crate::dashboard::NotesApi;
use crate::models::{Difficulty, Note};
use crate::routes::auth::{LoginResponse, ProfileResponse, SignupResponse};
use crate::routes::MessageResponse;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {error}")]
    Api {
        status: StatusCode,
        error: String,
        details: Option<String>,
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Note {0} is not loaded")]
    UnknownNote(String),
}

impl ClientError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, Vec<String>>,
}

/// Body for creating a note. Omitted metadata takes the server defaults.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Partial update; only the set fields are sent.
///
/// The server HTML-escapes title, category, topic, tags and color on every
/// write, and notes come back in escaped form. Set only the fields that
/// actually changed: echoing a loaded `&amp;` back turns it into `&amp;amp;`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NoteChanges {
    pub fn favorite(is_favorite: bool) -> Self {
        Self {
            is_favorite: Some(is_favorite),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for one API base URL, optionally holding a bearer token.
#[derive(Debug, Clone)]
pub struct NotesClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl NotesClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Use an existing token, e.g. one delivered by the OAuth redirect.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotAuthenticated)?;
        Ok(builder.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<ApiErrorBody>(&body).ok();
            return Err(match parsed {
                Some(err) => ClientError::Api {
                    status,
                    error: err.error,
                    details: err.details,
                    fields: err.fields,
                },
                None => ClientError::Api {
                    status,
                    error: "unexpected_response".to_string(),
                    details: Some(body),
                    fields: BTreeMap::new(),
                },
            });
        }

        Ok(response.json().await?)
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<SignupResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/api/auth/signup"))
            .json(&Credentials { email, password });
        Self::send(request).await
    }

    /// Log in and keep the returned token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&Credentials { email, password });
        let response: LoginResponse = Self::send(request).await?;

        tracing::debug!(user_id = %response.user_id, "Logged in");
        self.token = Some(response.token.clone());
        Ok(response)
    }

    pub async fn profile(&self) -> Result<ProfileResponse, ClientError> {
        let request = self.authed(self.http.get(self.url("/api/auth/profile")))?;
        Self::send(request).await
    }

    /// Attach a file to a note. Only images and PDFs are accepted.
    pub async fn upload_attachment(
        &self,
        id: &str,
        file_name: &str,
        media_type: &str,
        data: Vec<u8>,
    ) -> Result<Note, ClientError> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(media_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let request = self.authed(
            self.http
                .post(self.url(&format!("/api/notes/{}/upload", id)))
                .multipart(form),
        )?;
        Self::send(request).await
    }
}

#[async_trait]
impl NotesApi for NotesClient {
    async fn list_notes(&self) -> Result<Vec<Note>, ClientError> {
        let request = self.authed(self.http.get(self.url("/api/notes")))?;
        Self::send(request).await
    }

    async fn create_note(&self, note: &NewNote) -> Result<Note, ClientError> {
        let request = self.authed(self.http.post(self.url("/api/notes")).json(note))?;
        Self::send(request).await
    }

    async fn update_note(&self, id: &str, changes: &NoteChanges) -> Result<Note, ClientError> {
        let request = self.authed(
            self.http
                .put(self.url(&format!("/api/notes/{}", id)))
                .json(changes),
        )?;
        Self::send(request).await
    }

    async fn delete_note(&self, id: &str) -> Result<(), ClientError> {
        let request = self.authed(self.http.delete(self.url(&format!("/api/notes/{}", id))))?;
        let _: MessageResponse = Self::send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_only_serialize_set_fields() {
        let body = serde_json::to_value(NoteChanges::favorite(true)).unwrap();
        assert_eq!(body, serde_json::json!({ "isFavorite": true }));

        let body = serde_json::to_value(NewNote {
            difficulty: Some(Difficulty::Hard),
            ..NewNote::new("T", "C")
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "title": "T", "content": "C", "difficulty": "Hard" })
        );
    }

    #[tokio::test]
    async fn test_requires_token_for_notes() {
        let client = NotesClient::new("http://127.0.0.1:9/");
        assert_eq!(client.url("/api/notes"), "http://127.0.0.1:9/api/notes");

        let err = client.list_notes().await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }
}
