//! Stable comparators for task and note views.
//!
//! # Invariants
//! - Sorting never mutates the source collection; callers get a new ordering.
//! - Every sort is stable: equal keys keep their input order.
//! - Undated tasks sort after every dated task under `TaskSortKey::Date`.

use crate::model::note::Note;
use crate::model::task::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSortKey {
    /// Ascending due date, undated last.
    #[default]
    Date,
    /// High, medium, low.
    Priority,
    /// Newest first.
    Created,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSortKey {
    /// Newest created first.
    #[default]
    Recent,
    Alphabetical,
    /// Most recently modified first.
    Modified,
}

pub fn compare_tasks(left: &Task, right: &Task, key: TaskSortKey) -> Ordering {
    match key {
        TaskSortKey::Date => match (left.due_date, right.due_date) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        TaskSortKey::Priority => right.priority.weight().cmp(&left.priority.weight()),
        TaskSortKey::Created => right.created_at.cmp(&left.created_at),
    }
}

/// Title comparison approximating a locale collation. Base letters compare
/// first, ignoring accents and case; then accents; lowercase wins a
/// case-only tie.
pub fn compare_titles(left: &str, right: &str) -> Ordering {
    collation_key(left)
        .cmp(&collation_key(right))
        .then_with(|| left.to_lowercase().cmp(&right.to_lowercase()))
        .then_with(|| right.cmp(left))
}

/// Lowercased base letters: decomposed, with combining marks dropped.
fn collation_key(title: &str) -> String {
    title
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase()
}

pub fn compare_notes(left: &Note, right: &Note, key: NoteSortKey) -> Ordering {
    match key {
        NoteSortKey::Recent => right.created_at.cmp(&left.created_at),
        NoteSortKey::Alphabetical => compare_titles(&left.title, &right.title),
        NoteSortKey::Modified => right.modified_at.cmp(&left.modified_at),
    }
}

pub fn sort_tasks<'a, I>(tasks: I, key: TaskSortKey) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut sorted: Vec<&Task> = tasks.into_iter().collect();
    sorted.sort_by(|left, right| compare_tasks(left, right, key));
    sorted
}

pub fn sort_notes<'a, I>(notes: I, key: NoteSortKey) -> Vec<&'a Note>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut sorted: Vec<&Note> = notes.into_iter().collect();
    sorted.sort_by(|left, right| compare_notes(left, right, key));
    sorted
}
