// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation: a JSON extractor that normalizes and validates its
//! payload, plus the field checks shared by the note and auth routes.

use crate::error::AppError;
use crate::models::Difficulty;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

/// Longest allowed single tag, in characters.
pub const MAX_TAG_LEN: usize = 30;

/// Normalization applied to a request body before validation (trimming,
/// lowercasing emails).
pub trait Sanitize {
    fn sanitize(&mut self) {}
}

/// JSON body that has been sanitized and validated.
///
/// Malformed JSON becomes `400 bad_request`; failed field checks become
/// `400 validation_error` with per-field messages.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Sanitize,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value.sanitize();
        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// Trim an optional string in place.
pub fn trim_in_place(value: &mut Option<String>) {
    if let Some(v) = value {
        let trimmed = v.trim();
        if trimmed.len() != v.len() {
            *v = trimmed.to_string();
        }
    }
}

/// Escape HTML-significant characters so stored text is inert when rendered.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

pub fn validate_difficulty(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Difficulty>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("difficulty"))
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.chars().count() > MAX_TAG_LEN) {
        return Err(ValidationError::new("tag_length"));
    }
    Ok(())
}

/// Note IDs are UUIDs; anything else is rejected before touching the store.
pub fn parse_note_id(raw: &str) -> Result<String, AppError> {
    uuid::Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.add(
                "id",
                ValidationError::new("note_id").with_message("Invalid note ID".into()),
            );
            AppError::Validation(errors)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>Tom & \"Jerry\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;&#x2F;b&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_trim_in_place() {
        let mut value = Some("  padded ".to_string());
        trim_in_place(&mut value);
        assert_eq!(value.as_deref(), Some("padded"));

        let mut none: Option<String> = None;
        trim_in_place(&mut none);
        assert!(none.is_none());
    }

    #[test]
    fn test_validate_tags() {
        assert!(validate_tags(&["short".to_string()]).is_ok());
        assert!(validate_tags(&["x".repeat(31)]).is_err());
    }

    #[test]
    fn test_parse_note_id() {
        let id = uuid::Uuid::new_v4().to_string();
        assert_eq!(parse_note_id(&id).unwrap(), id);
        assert!(matches!(
            parse_note_id("not-a-uuid"),
            Err(AppError::Validation(_))
        ));
    }
}
