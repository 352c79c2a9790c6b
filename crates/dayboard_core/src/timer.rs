//! Virtual-time timer queue for delayed state transitions.
//!
//! # Responsibility
//! - Hold fire-once jobs scheduled for a future instant.
//! - Release due jobs in a deterministic order when the host ticks.
//!
//! # Invariants
//! - Due jobs are released ordered by `(due_at, scheduling order)`.
//! - A cancelled timer is never released.
//! - Timer ids are unique for the lifetime of one queue.
//!
//! Jobs only carry entity ids; owners must re-check that the target still
//! exists when a job fires.

use crate::clock::Timestamp;

/// Handle returned by [`TimerQueue::schedule`].
pub type TimerId = u64;

/// One scheduled job with its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTimer<J> {
    pub id: TimerId,
    pub due_at: Timestamp,
    pub job: J,
}

/// Fire-once timers in virtual time.
#[derive(Debug, Clone)]
pub struct TimerQueue<J> {
    next_id: TimerId,
    timers: Vec<ScheduledTimer<J>>,
}

impl<J> Default for TimerQueue<J> {
    fn default() -> Self {
        Self {
            next_id: 1,
            timers: Vec::new(),
        }
    }
}

impl<J> TimerQueue<J> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `job` to fire once `due_at` is reached.
    pub fn schedule(&mut self, due_at: Timestamp, job: J) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.push(ScheduledTimer { id, due_at, job });
        id
    }

    /// Cancels one timer. Returns `false` when it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest pending due instant.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.timers.iter().map(|timer| timer.due_at).min()
    }

    /// Removes and returns every timer due at or before `now`, each with its
    /// scheduled `due_at`.
    pub fn drain_due(&mut self, now: Timestamp) -> Vec<ScheduledTimer<J>> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .timers
            .drain(..)
            .partition(|timer| timer.due_at <= now);
        self.timers = pending;

        due.sort_by(|left, right| {
            left.due_at
                .cmp(&right.due_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        due
    }
}
