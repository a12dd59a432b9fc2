// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod oauth;
pub mod password;
pub mod storage;

pub use oauth::{OAuthClient, ProviderProfile};
pub use storage::{
    AttachmentStore, CloudinaryStore, DisabledStore, MemoryAttachmentStore, StoredObject,
    UploadRequest,
};
