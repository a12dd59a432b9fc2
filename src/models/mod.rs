// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod note;
pub mod user;

pub use note::{Attachment, AttachmentKind, Difficulty, Note, NotePatch};
pub use user::{AuthProvider, User};
