// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Search, category/tag selection and sorting.

use crate::models::Note;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};

/// Category selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    fn matches(&self, note: &Note) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => note.category == *category,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
    RecentlyUpdated,
    /// Easy first, ties newest first.
    Difficulty,
}

/// Current filter selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub query: String,
    pub category: CategoryFilter,
    /// A note must carry every selected tag.
    pub tags: BTreeSet<String>,
    pub sort: SortKey,
    pub favorites_only: bool,
}

impl NoteFilter {
    /// Whether `note` passes the query, category, tag and favorite checks.
    pub fn matches(&self, note: &Note) -> bool {
        if self.favorites_only && !note.is_favorite {
            return false;
        }
        if !self.category.matches(note) {
            return false;
        }
        if !self.tags.iter().all(|tag| note.has_tag(tag)) {
            return false;
        }
        matches_query(note, &self.query)
    }
}

fn matches_query(note: &Note, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    let q = query.to_lowercase();

    note.title.to_lowercase().contains(&q)
        || note.content.to_lowercase().contains(&q)
        || note.topic.to_lowercase().contains(&q)
        || note.tags.iter().any(|t| t.to_lowercase().contains(&q))
}

fn compare(sort: SortKey, a: &Note, b: &Note) -> Ordering {
    match sort {
        SortKey::Newest => b.created_at.cmp(&a.created_at),
        SortKey::Oldest => a.created_at.cmp(&b.created_at),
        SortKey::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
        SortKey::RecentlyUpdated => b.updated_at.cmp(&a.updated_at),
        SortKey::Difficulty => (a.difficulty, Reverse(a.created_at))
            .cmp(&(b.difficulty, Reverse(b.created_at))),
    }
}

/// Apply `filter` to `notes`, returning the visible notes in display order.
pub fn filter_notes<'a>(notes: &'a [Note], filter: &NoteFilter) -> Vec<&'a Note> {
    let mut visible: Vec<&Note> = notes.iter().filter(|n| filter.matches(n)).collect();
    visible.sort_by(|a, b| compare(filter.sort, a, b));
    visible
}

/// Distinct categories, sorted.
pub fn categories(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .map(|n| n.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of notes carrying each tag.
pub fn tag_counts(notes: &[Note]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for note in notes {
        // A tag repeated on one note still counts once
        for tag in note.tags.iter().collect::<BTreeSet<_>>() {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::{Duration, TimeZone, Utc};

    fn note(title: &str, tags: &[&str], minutes_ago: i64) -> Note {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut n = Note::new("u1", title.to_string(), format!("{} body", title));
        n.tags = tags.iter().map(|t| t.to_string()).collect();
        n.created_at = base - Duration::minutes(minutes_ago);
        n.updated_at = n.created_at;
        n
    }

    fn titles(notes: &[&Note]) -> Vec<String> {
        notes.iter().map(|n| n.title.clone()).collect()
    }

    #[test]
    fn test_tag_filter_requires_all_tags() {
        let notes = vec![
            note("both", &["x", "y"], 1),
            note("only x", &["x"], 2),
            note("only y", &["y"], 3),
            note("both plus", &["y", "z", "x"], 4),
        ];
        let filter = NoteFilter {
            tags: ["x".to_string(), "y".to_string()].into_iter().collect(),
            ..Default::default()
        };

        assert_eq!(
            titles(&filter_notes(&notes, &filter)),
            vec!["both", "both plus"]
        );
    }

    #[test]
    fn test_query_is_case_insensitive_across_fields() {
        let mut tagged = note("Groceries", &["Errands"], 1);
        tagged.content = "milk".to_string();
        let mut topical = note("Lecture", &[], 2);
        topical.topic = "Compilers".to_string();
        let notes = vec![tagged, topical, note("Other", &[], 3)];

        let by_tag = NoteFilter {
            query: "errand".to_string(),
            ..Default::default()
        };
        assert_eq!(titles(&filter_notes(&notes, &by_tag)), vec!["Groceries"]);

        let by_topic = NoteFilter {
            query: "  COMPILERS ".to_string(),
            ..Default::default()
        };
        assert_eq!(titles(&filter_notes(&notes, &by_topic)), vec!["Lecture"]);

        let blank = NoteFilter {
            query: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(filter_notes(&notes, &blank).len(), 3);
    }

    #[test]
    fn test_category_and_favorites() {
        let mut work = note("work", &[], 1);
        work.category = "Work".to_string();
        work.is_favorite = true;
        let mut work2 = note("work2", &[], 2);
        work2.category = "Work".to_string();
        let notes = vec![work, work2, note("general", &[], 3)];

        let filter = NoteFilter {
            category: CategoryFilter::Only("Work".to_string()),
            ..Default::default()
        };
        assert_eq!(titles(&filter_notes(&notes, &filter)), vec!["work", "work2"]);

        let favorites = NoteFilter {
            favorites_only: true,
            ..filter
        };
        assert_eq!(titles(&filter_notes(&notes, &favorites)), vec!["work"]);
    }

    #[test]
    fn test_sort_orders() {
        let mut hard = note("banana", &[], 30);
        hard.difficulty = Difficulty::Hard;
        let mut easy_old = note("Apple", &[], 20);
        easy_old.difficulty = Difficulty::Easy;
        let mut easy_new = note("cherry", &[], 10);
        easy_new.difficulty = Difficulty::Easy;
        easy_new.updated_at = easy_new.created_at - Duration::hours(1);
        let notes = vec![hard, easy_old, easy_new];

        let sorted = |sort| {
            titles(&filter_notes(
                &notes,
                &NoteFilter {
                    sort,
                    ..Default::default()
                },
            ))
        };

        assert_eq!(sorted(SortKey::Newest), vec!["cherry", "Apple", "banana"]);
        assert_eq!(sorted(SortKey::Oldest), vec!["banana", "Apple", "cherry"]);
        assert_eq!(sorted(SortKey::TitleAsc), vec!["Apple", "banana", "cherry"]);
        assert_eq!(sorted(SortKey::TitleDesc), vec!["cherry", "banana", "Apple"]);
        assert_eq!(
            sorted(SortKey::RecentlyUpdated),
            vec!["Apple", "banana", "cherry"]
        );
        assert_eq!(
            sorted(SortKey::Difficulty),
            vec!["cherry", "Apple", "banana"]
        );
    }

    #[test]
    fn test_facets() {
        let mut a = note("a", &["rust", "web"], 1);
        a.category = "Work".to_string();
        let b = note("b", &["rust", "rust"], 2);
        let notes = vec![a, b];

        assert_eq!(categories(&notes), vec!["General", "Work"]);

        let counts = tag_counts(&notes);
        assert_eq!(counts["rust"], 2);
        assert_eq!(counts["web"], 1);
    }
}
