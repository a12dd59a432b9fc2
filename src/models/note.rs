// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Note model for storage and API.
//!
//! The same document shape is stored in Firestore and returned to clients,
//! so field names follow the web client's camelCase convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_TOPIC: &str = "Miscellaneous";
pub const DEFAULT_COLOR: &str = "default";

/// Fixed difficulty scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or(())
    }
}

/// How an attachment should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Pdf,
}

impl AttachmentKind {
    /// Classify an upload by its declared media type.
    ///
    /// Returns `None` for anything that is neither a PDF nor an image.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "application/pdf" {
            Some(AttachmentKind::Pdf)
        } else if essence.starts_with("image/") && essence.len() > "image/".len() {
            Some(AttachmentKind::Image)
        } else {
            None
        }
    }
}

/// File stored in the object store and linked to a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Attachment {
    pub url: String,
    /// Object-store identifier
    pub public_id: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
}

/// A user-owned note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// UUID (also used as document ID)
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    /// Owning user ID
    pub user: String,
    pub category: String,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub is_favorite: bool,
    pub color: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// New note owned by `user_id`, with defaults for omitted metadata.
    pub fn new(user_id: &str, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            content,
            user: user_id.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            difficulty: Difficulty::default(),
            tags: Vec::new(),
            attachments: Vec::new(),
            is_favorite: false,
            color: DEFAULT_COLOR.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user == user_id
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
    pub color: Option<String>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        *self == NotePatch::default()
    }

    /// Merge the provided fields into `note` and bump `updated_at`.
    ///
    /// An empty title or content counts as "not provided" so a note can
    /// never lose its required fields through an update.
    pub fn apply(self, note: &mut Note) {
        if let Some(title) = self.title.filter(|t| !t.is_empty()) {
            note.title = title;
        }
        if let Some(content) = self.content.filter(|c| !c.is_empty()) {
            note.content = content;
        }
        if let Some(category) = self.category {
            note.category = category;
        }
        if let Some(topic) = self.topic {
            note.topic = topic;
        }
        if let Some(difficulty) = self.difficulty {
            note.difficulty = difficulty;
        }
        if let Some(tags) = self.tags {
            note.tags = tags;
        }
        if let Some(is_favorite) = self.is_favorite {
            note.is_favorite = is_favorite;
        }
        if let Some(color) = self.color {
            note.color = color;
        }
        note.updated_at = Utc::now();
    }
}
