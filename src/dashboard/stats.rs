// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard counters and time labels.

use crate::models::Note;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Summary counters shown above the note grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub favorites: usize,
    /// Created on the same calendar day as `now`.
    pub today: usize,
    pub yesterday: usize,
    /// Created within the last 7×24h.
    pub this_week: usize,
    /// Created in the 7×24h before that.
    pub last_week: usize,
    pub today_trend: i64,
    pub week_trend: i64,
}

impl DashboardStats {
    /// Compute from the full history. Calendar days are taken in the
    /// timezone of `now`.
    pub fn compute<Tz: TimeZone>(notes: &[Note], now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let yesterday = today.pred_opt();

        let now_utc = now.with_timezone(&Utc);
        let week_start = now_utc - Duration::days(7);
        let last_week_start = now_utc - Duration::days(14);

        let mut stats = DashboardStats {
            total: notes.len(),
            ..Default::default()
        };

        for note in notes {
            if note.is_favorite {
                stats.favorites += 1;
            }

            let day = note.created_at.with_timezone(&tz).date_naive();
            if day == today {
                stats.today += 1;
            } else if Some(day) == yesterday {
                stats.yesterday += 1;
            }

            if note.created_at >= week_start {
                stats.this_week += 1;
            } else if note.created_at >= last_week_start {
                stats.last_week += 1;
            }
        }

        stats.today_trend = trend_percent(stats.today, stats.yesterday);
        stats.week_trend = trend_percent(stats.this_week, stats.last_week);
        stats
    }
}

/// Percentage change from `previous` to `current`, rounded half up.
///
/// With no previous activity the trend is 100 when anything happened and 0
/// otherwise.
pub fn trend_percent(current: usize, previous: usize) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    let change = (current as f64 - previous as f64) / previous as f64 * 100.0;
    (change + 0.5).floor() as i64
}

/// Short label for when a note was created: "Just now", "5m ago", "3h ago",
/// "2d ago", or the month and day ("Jan 5") for anything a week or older.
pub fn relative_time<Tz>(created: DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let elapsed = now.with_timezone(&Utc) - created;

    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        created
            .with_timezone(&now.timezone())
            .format("%b %-d")
            .to_string()
    }
}
