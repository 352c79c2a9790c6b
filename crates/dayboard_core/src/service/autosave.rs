//! Debounced auto-save of note edits.
//!
//! # Responsibility
//! - Keep at most one pending edit per note and its commit deadline.
//! - Release the latest edit once its debounce window elapses.
//!
//! # Invariants
//! - Scheduling an edit cancels the previous timer of that note and merges
//!   the new fields over the pending ones (last write wins per field).
//! - A cancelled edit is never released.
//! - The scheduler never touches notes; the owner commits released edits.

use crate::clock::Timestamp;
use crate::model::note::{NoteId, NotePatch};
use crate::timer::{TimerId, TimerQueue};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Auto-save indicator for one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum AutoSaveStatus {
    /// Nothing pending and nothing committed in this session.
    Idle,
    Pending { due_at: Timestamp },
    /// Last commit instant; no edit is pending.
    Committed { at: Timestamp },
}

/// Edit whose debounce window elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasedEdit {
    pub note_id: NoteId,
    pub patch: NotePatch,
    /// Deadline the edit was scheduled for; commits are stamped with it.
    pub due_at: Timestamp,
}

#[derive(Debug, Clone)]
struct PendingEdit {
    timer: TimerId,
    due_at: Timestamp,
    patch: NotePatch,
}

#[derive(Debug, Clone)]
pub struct AutoSaveScheduler {
    delay: TimeDelta,
    timers: TimerQueue<NoteId>,
    pending: HashMap<NoteId, PendingEdit>,
    committed: HashMap<NoteId, Timestamp>,
}

impl AutoSaveScheduler {
    pub fn new(delay: TimeDelta) -> Self {
        Self {
            delay,
            timers: TimerQueue::new(),
            pending: HashMap::new(),
            committed: HashMap::new(),
        }
    }

    pub fn delay(&self) -> TimeDelta {
        self.delay
    }

    /// (Re)starts the countdown for `note_id` and returns the new deadline.
    pub fn schedule(&mut self, note_id: NoteId, edit: NotePatch, now: Timestamp) -> Timestamp {
        let due_at = now + self.delay;
        let patch = match self.pending.remove(&note_id) {
            Some(previous) => {
                self.timers.cancel(previous.timer);
                let mut merged = previous.patch;
                merged.merge(edit);
                merged
            }
            None => edit,
        };
        let timer = self.timers.schedule(due_at, note_id);
        self.pending.insert(
            note_id,
            PendingEdit {
                timer,
                due_at,
                patch,
            },
        );
        due_at
    }

    /// Drops the pending edit of `note_id`, returning it when one existed.
    pub fn cancel_for(&mut self, note_id: NoteId) -> Option<NotePatch> {
        let pending = self.pending.remove(&note_id)?;
        self.timers.cancel(pending.timer);
        Some(pending.patch)
    }

    /// Forgets everything about `note_id`, including its last commit.
    pub fn forget(&mut self, note_id: NoteId) -> bool {
        let cancelled = self.cancel_for(note_id).is_some();
        self.committed.remove(&note_id);
        cancelled
    }

    /// Pending edit of `note_id`, if any.
    pub fn pending(&self, note_id: NoteId) -> Option<&NotePatch> {
        self.pending.get(&note_id).map(|pending| &pending.patch)
    }

    /// Removes and returns every edit whose deadline is at or before `now`.
    pub fn take_due(&mut self, now: Timestamp) -> Vec<ReleasedEdit> {
        let mut released = Vec::new();
        for timer in self.timers.drain_due(now) {
            let note_id = timer.job;
            let is_current = self
                .pending
                .get(&note_id)
                .is_some_and(|pending| pending.timer == timer.id);
            if !is_current {
                continue;
            }
            if let Some(pending) = self.pending.remove(&note_id) {
                released.push(ReleasedEdit {
                    note_id,
                    patch: pending.patch,
                    due_at: pending.due_at,
                });
            }
        }
        released
    }

    pub fn mark_committed(&mut self, note_id: NoteId, at: Timestamp) {
        self.committed.insert(note_id, at);
    }

    pub fn status(&self, note_id: NoteId) -> AutoSaveStatus {
        if let Some(pending) = self.pending.get(&note_id) {
            return AutoSaveStatus::Pending {
                due_at: pending.due_at,
            };
        }
        match self.committed.get(&note_id) {
            Some(at) => AutoSaveStatus::Committed { at: *at },
            None => AutoSaveStatus::Idle,
        }
    }

    pub fn next_due(&self) -> Option<Timestamp> {
        self.timers.next_due()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{AutoSaveScheduler, AutoSaveStatus};
    use crate::clock::local_timestamp;
    use crate::model::note::NotePatch;
    use chrono::TimeDelta;
    use uuid::Uuid;

    fn content(text: &str) -> NotePatch {
        NotePatch {
            content: Some(text.to_string()),
            ..NotePatch::default()
        }
    }

    #[test]
    fn new_edit_restarts_the_countdown_and_keeps_the_latest_fields() {
        let start = local_timestamp(2024, 1, 14, 9, 0, 0).expect("valid local time");
        let mut scheduler = AutoSaveScheduler::new(TimeDelta::milliseconds(2_000));
        assert_eq!(scheduler.delay(), TimeDelta::milliseconds(2_000));
        let note = Uuid::new_v4();

        scheduler.schedule(
            note,
            NotePatch {
                title: Some("Draft".to_string()),
                ..content("first")
            },
            start,
        );
        let due = scheduler.schedule(note, content("second"), start + TimeDelta::seconds(1));
        assert_eq!(scheduler.status(note), AutoSaveStatus::Pending { due_at: due });

        assert!(scheduler
            .take_due(start + TimeDelta::milliseconds(2_500))
            .is_empty());

        let released = scheduler.take_due(due + TimeDelta::seconds(3));
        assert_eq!(released.len(), 1);
        let edit = &released[0];
        assert_eq!(edit.note_id, note);
        assert_eq!(edit.due_at, due);
        assert_eq!(edit.patch.title.as_deref(), Some("Draft"));
        assert_eq!(edit.patch.content.as_deref(), Some("second"));
        assert_eq!(scheduler.status(note), AutoSaveStatus::Idle);
    }

    #[test]
    fn cancelled_edit_is_never_released() {
        let start = local_timestamp(2024, 1, 14, 9, 0, 0).expect("valid local time");
        let mut scheduler = AutoSaveScheduler::new(TimeDelta::milliseconds(2_000));
        let note = Uuid::new_v4();

        scheduler.schedule(note, content("draft"), start);
        assert!(scheduler.cancel_for(note).is_some());
        assert!(scheduler.take_due(start + TimeDelta::seconds(5)).is_empty());
        assert!(!scheduler.has_pending());
    }
}
