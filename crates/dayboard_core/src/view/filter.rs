//! Filter predicates for task, note and chat-thread views.
//!
//! # Responsibility
//! - Evaluate each facet (search text, category, tag set, favorites) as a
//!   pure predicate over one record.
//!
//! # Invariants
//! - An empty search string disables the search facet.
//! - Search is a case-insensitive substring match; the query is not trimmed.
//! - Tag filtering uses superset (AND) semantics.
//! - An undated task never matches `Today` or `Upcoming`.

use crate::model::chat::ChatThread;
use crate::model::note::Note;
use crate::model::task::Task;
use crate::view::sort::{NoteSortKey, TaskSortKey};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Task list tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    #[default]
    All,
    Today,
    Upcoming,
    Completed,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 4] = [Self::All, Self::Today, Self::Upcoming, Self::Completed];

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Today => "Today",
            Self::Upcoming => "Upcoming",
            Self::Completed => "Completed",
        }
    }
}

/// Query parameters of the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub search: String,
    pub category: TaskCategory,
    pub sort: TaskSortKey,
}

/// Query parameters of the note grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    pub search: String,
    pub selected_tags: Vec<String>,
    pub favorites_only: bool,
    pub sort: NoteSortKey,
}

/// Half-open calendar range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The single day `day`, i.e. `[day, day + 1)`.
    pub fn day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: next_day(day),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

fn next_day(day: NaiveDate) -> NaiveDate {
    day.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
}

/// Case-insensitive substring match.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn task_matches_search(task: &Task, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    contains_ignore_case(&task.title, search)
        || task
            .description
            .as_deref()
            .is_some_and(|description| contains_ignore_case(description, search))
}

/// Category membership relative to the local calendar date `today`.
pub fn task_in_category(task: &Task, category: TaskCategory, today: NaiveDate) -> bool {
    match category {
        TaskCategory::All => true,
        TaskCategory::Today => {
            !task.completed
                && task
                    .due_date
                    .is_some_and(|due| DateRange::day(today).contains(due))
        }
        TaskCategory::Upcoming => {
            !task.completed && task.due_date.is_some_and(|due| due >= next_day(today))
        }
        TaskCategory::Completed => task.completed,
    }
}

pub fn task_matches(task: &Task, query: &TaskQuery, today: NaiveDate) -> bool {
    task_matches_search(task, &query.search) && task_in_category(task, query.category, today)
}

pub fn note_matches_search(note: &Note, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    contains_ignore_case(&note.title, search)
        || contains_ignore_case(&note.content, search)
        || note.tags.iter().any(|tag| contains_ignore_case(tag, search))
}

pub fn note_matches(note: &Note, query: &NoteQuery) -> bool {
    note_matches_search(note, &query.search)
        && note.has_all_tags(&query.selected_tags)
        && (!query.favorites_only || note.is_favorite)
}

/// History sidebar search over thread titles.
pub fn thread_matches(thread: &ChatThread, search: &str) -> bool {
    search.is_empty() || contains_ignore_case(&thread.title, search)
}
