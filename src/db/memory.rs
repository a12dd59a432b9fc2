// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store with the same semantics as the Firestore
//! collections. Used by tests and `USE_MEMORY_DB` local runs.

use crate::models::{AuthProvider, Note, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Users and notes keyed by document ID.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    notes: DashMap<String, Note>,
    /// `(collection, value)` -> owning user ID
    user_keys: DashMap<(String, String), String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.value().clone())
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone())
    }

    pub fn find_user_by_provider(&self, provider: AuthProvider, provider_id: &str) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.provider_id(provider) == Some(provider_id))
            .map(|u| u.value().clone())
    }

    pub fn upsert_user(&self, user: &User) {
        self.users.insert(user.id.clone(), user.clone());
    }

    /// Claim a unique value for `user_id`. True if it is now held by that user.
    pub fn claim_user_key(&self, collection: &str, value: &str, user_id: &str) -> bool {
        match self
            .user_keys
            .entry((collection.to_string(), value.to_string()))
        {
            Entry::Occupied(holder) => holder.get() == user_id,
            Entry::Vacant(slot) => {
                slot.insert(user_id.to_string());
                true
            }
        }
    }

    pub fn release_user_key(&self, collection: &str, value: &str, user_id: &str) {
        self.user_keys
            .remove_if(&(collection.to_string(), value.to_string()), |_, holder| {
                holder == user_id
            });
    }

    pub fn get_note(&self, note_id: &str) -> Option<Note> {
        self.notes.get(note_id).map(|n| n.value().clone())
    }

    /// Unordered; callers sort.
    pub fn notes_for_user(&self, user_id: &str) -> Vec<Note> {
        self.notes
            .iter()
            .filter(|n| n.user == user_id)
            .map(|n| n.value().clone())
            .collect()
    }

    pub fn set_note(&self, note: &Note) {
        self.notes.insert(note.id.clone(), note.clone());
    }

    /// Returns whether a document was removed.
    pub fn delete_note(&self, note_id: &str) -> bool {
        self.notes.remove(note_id).is_some()
    }
}
