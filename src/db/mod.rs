// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore, with an in-process store for tests).

pub mod firestore;
pub mod memory;

pub use firestore::{FirestoreDb, UserKey};
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const NOTES: &str = "notes";

    /// Uniqueness claims, one document per claimed value.
    pub const USER_EMAILS: &str = "user_emails";
    pub const USER_GOOGLE_IDS: &str = "user_google_ids";
    pub const USER_GITHUB_IDS: &str = "user_github_ids";
}
