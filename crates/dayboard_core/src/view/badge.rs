//! Card-level projections: due status, previews, word counts and relative
//! timestamp labels.
//!
//! # Invariants
//! - Previews count characters, never bytes, so multi-byte text is never
//!   split inside a code point.
//! - Relative labels use whole elapsed days, rounded down.

use crate::clock::Timestamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Due-date badge of a task relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "days")]
pub enum DueStatus {
    Overdue,
    DueToday,
    DueTomorrow,
    /// Due further out; carries the number of days.
    DueIn(i64),
}

impl DueStatus {
    pub fn label(self) -> String {
        match self {
            Self::Overdue => "Overdue".to_string(),
            Self::DueToday => "Due today".to_string(),
            Self::DueTomorrow => "Due tomorrow".to_string(),
            Self::DueIn(days) => format!("Due in {days} days"),
        }
    }
}

pub fn due_status(due_date: Option<NaiveDate>, today: NaiveDate) -> Option<DueStatus> {
    let days = due_date?.signed_duration_since(today).num_days();
    Some(match days {
        d if d < 0 => DueStatus::Overdue,
        0 => DueStatus::DueToday,
        1 => DueStatus::DueTomorrow,
        d => DueStatus::DueIn(d),
    })
}

/// First `max_chars` characters of `content`, with `...` appended when cut.
pub fn preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Short "when" label for note cards.
///
/// - under one day: local time of day (`HH:MM`)
/// - one day: `Yesterday`
/// - under a week: `N days ago`
/// - otherwise: calendar date (`YYYY-MM-DD`)
pub fn relative_label(timestamp: Timestamp, now: Timestamp) -> String {
    let days = (now - timestamp).num_days();
    match days {
        d if d <= 0 => timestamp.format("%H:%M").to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{d} days ago"),
        _ => timestamp.format("%Y-%m-%d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{due_status, preview, relative_label, word_count, DueStatus};
    use crate::clock::local_timestamp;
    use chrono::{NaiveDate, TimeDelta};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn due_status_covers_each_badge() {
        let today = date(2024, 1, 14);
        assert_eq!(due_status(None, today), None);
        assert_eq!(due_status(Some(date(2024, 1, 13)), today), Some(DueStatus::Overdue));
        assert_eq!(due_status(Some(today), today), Some(DueStatus::DueToday));
        assert_eq!(
            due_status(Some(date(2024, 1, 15)), today),
            Some(DueStatus::DueTomorrow)
        );
        let far = due_status(Some(date(2024, 1, 20)), today).expect("dated");
        assert_eq!(far, DueStatus::DueIn(6));
        assert_eq!(far.label(), "Due in 6 days");
    }

    #[test]
    fn preview_truncates_on_characters() {
        assert_eq!(preview("short", 120), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
        assert_eq!(preview("abc", 3), "abc");
    }

    #[test]
    fn word_count_ignores_surrounding_whitespace() {
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count(" one  two\nthree "), 3);
    }

    #[test]
    fn relative_label_buckets_elapsed_days() {
        let now = local_timestamp(2024, 1, 14, 18, 0, 0).expect("valid local time");
        assert_eq!(relative_label(now - TimeDelta::hours(2), now), "16:00");
        assert_eq!(relative_label(now - TimeDelta::days(1), now), "Yesterday");
        assert_eq!(relative_label(now - TimeDelta::days(3), now), "3 days ago");
        assert_eq!(relative_label(now - TimeDelta::days(10), now), "2024-01-04");
    }
}
