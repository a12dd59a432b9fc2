// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side derived views over a user's notes.
//!
//! Everything here is recomputed from the full note set on each call; there
//! is no caching and no pagination.

pub mod board;
pub mod filter;
pub mod stats;

pub use board::{NoteBoard, NotesApi};
pub use filter::{categories, filter_notes, tag_counts, CategoryFilter, NoteFilter, SortKey};
pub use stats::{relative_time, trend_percent, DashboardStats};
