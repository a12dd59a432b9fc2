// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local note set kept in step with the server.

use crate::client::{ClientError, NewNote, NoteChanges};
use crate::dashboard::filter::{filter_notes, NoteFilter};
use crate::dashboard::stats::DashboardStats;
use crate::models::Note;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};

/// Note CRUD as seen from the client.
#[async_trait]
pub trait NotesApi: Send + Sync {
    async fn list_notes(&self) -> Result<Vec<Note>, ClientError>;

    async fn create_note(&self, note: &NewNote) -> Result<Note, ClientError>;

    async fn update_note(&self, id: &str, changes: &NoteChanges) -> Result<Note, ClientError>;

    async fn delete_note(&self, id: &str) -> Result<(), ClientError>;
}

/// The caller's notes as currently displayed, newest first after a refresh.
#[derive(Debug, Clone, Default)]
pub struct NoteBoard {
    notes: Vec<Note>,
}

impl NoteBoard {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    fn position(&self, id: &str) -> Result<usize, ClientError> {
        self.notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| ClientError::UnknownNote(id.to_string()))
    }

    /// Replace the local set with the server's.
    pub async fn refresh<A: NotesApi + ?Sized>(&mut self, api: &A) -> Result<(), ClientError> {
        self.notes = api.list_notes().await?;
        Ok(())
    }

    pub fn view(&self, filter: &NoteFilter) -> Vec<&Note> {
        filter_notes(&self.notes, filter)
    }

    pub fn stats<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DashboardStats {
        DashboardStats::compute(&self.notes, now)
    }

    /// Create on the server, then show the new note first.
    pub async fn create<A: NotesApi + ?Sized>(
        &mut self,
        api: &A,
        note: &NewNote,
    ) -> Result<&Note, ClientError> {
        let created = api.create_note(note).await?;
        self.notes.insert(0, created);
        Ok(&self.notes[0])
    }

    /// Update on the server, then replace the local copy with the result.
    pub async fn update<A: NotesApi + ?Sized>(
        &mut self,
        api: &A,
        id: &str,
        changes: &NoteChanges,
    ) -> Result<&Note, ClientError> {
        let index = self.position(id)?;
        let updated = api.update_note(id, changes).await?;
        self.notes[index] = updated;
        Ok(&self.notes[index])
    }

    /// Remove locally once the server has confirmed the delete.
    pub async fn delete<A: NotesApi + ?Sized>(&mut self, api: &A, id: &str) -> Result<(), ClientError> {
        let index = self.position(id)?;
        api.delete_note(id).await?;
        self.notes.remove(index);
        Ok(())
    }

    /// Flip the favorite flag immediately, then confirm with the server.
    ///
    /// On success the local note is replaced by the server copy. On failure
    /// the previous flag is restored and the error returned. Returns the new
    /// flag value.
    pub async fn toggle_favorite<A: NotesApi + ?Sized>(
        &mut self,
        api: &A,
        id: &str,
    ) -> Result<bool, ClientError> {
        let index = self.position(id)?;
        let previous = self.notes[index].is_favorite;
        self.notes[index].is_favorite = !previous;

        match api.update_note(id, &NoteChanges::favorite(!previous)).await {
            Ok(updated) => {
                let is_favorite = updated.is_favorite;
                self.notes[index] = updated;
                Ok(is_favorite)
            }
            Err(e) => {
                tracing::warn!(note_id = %id, error = %e, "Favorite toggle failed, rolling back");
                self.notes[index].is_favorite = previous;
                Err(e)
            }
        }
    }
}
