// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Note CRUD and attachment upload routes.
//!
//! Every handler is scoped to the authenticated caller: listing returns only
//! the caller's notes, and mutations check ownership before touching the
//! store.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Attachment, AttachmentKind, Difficulty, Note, NotePatch};
use crate::routes::MessageResponse;
use crate::services::UploadRequest;
use crate::validation::{
    escape_html, parse_note_id, trim_in_place, Sanitize, ValidatedJson,
};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Largest accepted attachment upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Note routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/{id}", put(update_note).delete(delete_note))
        .route(
            "/api/notes/{id}/upload",
            post(upload_attachment).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

// ─── Request Bodies ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    #[serde(default)]
    #[validate(
        custom(function = "crate::validation::validate_not_blank", message = "Title is required"),
        length(max = 200, message = "Title must be at most 200 characters")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(
        custom(function = "crate::validation::validate_not_blank", message = "Content is required"),
        length(max = 50000, message = "Content must be at most 50,000 characters")
    )]
    pub content: String,
    #[validate(length(max = 50, message = "Category must be at most 50 characters"))]
    pub category: Option<String>,
    #[validate(length(max = 50, message = "Topic must be at most 50 characters"))]
    pub topic: Option<String>,
    #[validate(custom(
        function = "crate::validation::validate_difficulty",
        message = "Difficulty must be Easy, Medium, or Hard"
    ))]
    pub difficulty: Option<String>,
    #[validate(
        length(max = 20, message = "Tags must be an array with at most 20 items"),
        custom(
            function = "crate::validation::validate_tags",
            message = "Each tag must be at most 30 characters"
        )
    )]
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 50000, message = "Content must be at most 50,000 characters"))]
    pub content: Option<String>,
    #[validate(length(max = 50, message = "Category must be at most 50 characters"))]
    pub category: Option<String>,
    #[validate(length(max = 50, message = "Topic must be at most 50 characters"))]
    pub topic: Option<String>,
    #[validate(custom(
        function = "crate::validation::validate_difficulty",
        message = "Difficulty must be Easy, Medium, or Hard"
    ))]
    pub difficulty: Option<String>,
    #[validate(
        length(max = 20, message = "Tags must be an array with at most 20 items"),
        custom(
            function = "crate::validation::validate_tags",
            message = "Each tag must be at most 30 characters"
        )
    )]
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
    pub color: Option<String>,
}

fn trim_tags(tags: &mut Option<Vec<String>>) {
    if let Some(tags) = tags {
        for tag in tags.iter_mut() {
            *tag = tag.trim().to_string();
        }
        tags.retain(|t| !t.is_empty());
    }
}

impl Sanitize for CreateNoteRequest {
    fn sanitize(&mut self) {
        self.title = self.title.trim().to_string();
        trim_in_place(&mut self.category);
        trim_in_place(&mut self.topic);
        trim_in_place(&mut self.color);
        trim_tags(&mut self.tags);
    }
}

impl Sanitize for UpdateNoteRequest {
    fn sanitize(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.category);
        trim_in_place(&mut self.topic);
        trim_in_place(&mut self.color);
        trim_tags(&mut self.tags);
    }
}

fn escape_opt(value: Option<String>) -> Option<String> {
    value.map(|v| escape_html(&v))
}

fn escape_tags(tags: Option<Vec<String>>) -> Option<Vec<String>> {
    tags.map(|tags| tags.iter().map(|t| escape_html(t)).collect())
}

/// Already validated, so an unparseable difficulty cannot reach here.
fn parse_difficulty(value: Option<String>) -> Option<Difficulty> {
    value.and_then(|d| d.parse().ok())
}

impl UpdateNoteRequest {
    /// Convert into a patch, escaping free-text fields.
    pub fn into_patch(self) -> NotePatch {
        NotePatch {
            title: escape_opt(self.title),
            content: self.content,
            category: escape_opt(self.category),
            topic: escape_opt(self.topic),
            difficulty: parse_difficulty(self.difficulty),
            tags: escape_tags(self.tags),
            is_favorite: self.is_favorite,
            color: escape_opt(self.color),
        }
    }
}

impl CreateNoteRequest {
    /// Build the new note owned by `user_id`, escaping free-text fields.
    pub fn into_note(self, user_id: &str) -> Note {
        let mut note = Note::new(user_id, escape_html(&self.title), self.content);

        if let Some(category) = escape_opt(self.category) {
            note.category = category;
        }
        if let Some(topic) = escape_opt(self.topic) {
            note.topic = topic;
        }
        if let Some(difficulty) = parse_difficulty(self.difficulty) {
            note.difficulty = difficulty;
        }
        if let Some(tags) = escape_tags(self.tags) {
            note.tags = tags;
        }
        note.is_favorite = self.is_favorite.unwrap_or(false);
        if let Some(color) = escape_opt(self.color).filter(|c| !c.is_empty()) {
            note.color = color;
        }

        note
    }
}

// ─── Handlers ────────────────────────────────────────────────

/// Load a note the caller owns: 400 for a malformed id, 404 when missing,
/// 403 when it belongs to someone else.
async fn load_owned_note(state: &AppState, user: &AuthUser, raw_id: &str) -> Result<Note> {
    let note_id = parse_note_id(raw_id)?;

    let note = state
        .db
        .get_note(&note_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;

    if !note.is_owned_by(&user.user_id) {
        tracing::warn!(
            user_id = %user.user_id,
            note_id = %note_id,
            "Rejected access to another user's note"
        );
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    Ok(note)
}

/// Create a note owned by the caller.
async fn create_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>)> {
    let note = req.into_note(&user.user_id);
    state.db.set_note(&note).await?;

    tracing::info!(user_id = %user.user_id, note_id = %note.id, "Note created");

    Ok((StatusCode::CREATED, Json(note)))
}

/// List the caller's notes, newest first.
async fn list_notes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Note>>> {
    let notes = state.db.list_notes_for_user(&user.user_id).await?;

    tracing::debug!(user_id = %user.user_id, count = notes.len(), "Fetched notes");

    Ok(Json(notes))
}

/// Merge the provided fields into a note the caller owns.
async fn update_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateNoteRequest>,
) -> Result<Json<Note>> {
    let mut note = load_owned_note(&state, &user, &id).await?;

    let patch = req.into_patch();
    if patch.is_empty() {
        tracing::debug!(note_id = %note.id, "Update with no fields");
    }
    patch.apply(&mut note);

    state.db.set_note(&note).await?;

    tracing::info!(user_id = %user.user_id, note_id = %note.id, "Note updated");

    Ok(Json(note))
}

/// Permanently delete a note the caller owns.
async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let note = load_owned_note(&state, &user, &id).await?;

    state.db.delete_note(&note.id).await?;

    tracing::info!(user_id = %user.user_id, note_id = %note.id, "Note deleted");

    Ok(MessageResponse::new("Note deleted"))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!(
            "Attachments are limited to {} MiB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        ))
    } else {
        AppError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

/// Upload a file (multipart field `file`) and attach it to a note.
///
/// The request blocks until the object store acknowledges the upload.
async fn upload_attachment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Note>> {
    let mut note = load_owned_note(&state, &user, &id).await?;

    let mut upload: Option<(String, String, axum::body::Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue; // ignore unknown fields
        }
        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, media_type, data));
    }

    let (file_name, media_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    let kind = AttachmentKind::from_media_type(&media_type).ok_or_else(|| {
        AppError::BadRequest("Only image and PDF files are allowed".to_string())
    })?;

    let size = data.len();
    let stored = state
        .storage
        .upload(UploadRequest {
            data,
            file_name,
            media_type,
            kind,
            folder: state.config.upload_folder.clone(),
        })
        .await?;

    note.attachments.push(Attachment {
        url: stored.url,
        public_id: stored.public_id,
        kind,
    });
    note.updated_at = chrono::Utc::now();
    state.db.set_note(&note).await?;

    tracing::info!(
        user_id = %user.user_id,
        note_id = %note.id,
        size,
        kind = ?kind,
        "Attachment uploaded"
    );

    Ok(Json(note))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_escapes_and_defaults() {
        let mut req: CreateNoteRequest = serde_json::from_value(serde_json::json!({
            "title": "  <script>hi</script> ",
            "content": "raw <b>content</b>",
            "tags": [" rust ", "", "web"],
            "difficulty": "Hard"
        }))
        .unwrap();
        req.sanitize();
        req.validate().unwrap();

        let note = req.into_note("u1");
        assert_eq!(note.title, "&lt;script&gt;hi&lt;&#x2F;script&gt;");
        // Content is stored as written
        assert_eq!(note.content, "raw <b>content</b>");
        assert_eq!(note.tags, vec!["rust".to_string(), "web".to_string()]);
        assert_eq!(note.difficulty, Difficulty::Hard);
        assert_eq!(note.category, "General");
        assert_eq!(note.color, "default");
        assert!(!note.is_favorite);
    }

    #[test]
    fn test_create_request_requires_title_and_content() {
        let mut req: CreateNoteRequest =
            serde_json::from_value(serde_json::json!({ "title": "   " })).unwrap();
        req.sanitize();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("content"));
    }

    #[test]
    fn test_update_request_rejects_bad_difficulty_and_tags() {
        let req = UpdateNoteRequest {
            difficulty: Some("Impossible".to_string()),
            tags: Some(vec!["t".repeat(31)]),
            ..Default::default()
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("difficulty"));
        assert!(fields.contains_key("tags"));
    }

    #[test]
    fn test_update_request_into_patch() {
        let patch = UpdateNoteRequest {
            is_favorite: Some(true),
            ..Default::default()
        }
        .into_patch();
        assert_eq!(patch.is_favorite, Some(true));
        assert!(patch.title.is_none());
        assert!(patch.tags.is_none());
    }
}
