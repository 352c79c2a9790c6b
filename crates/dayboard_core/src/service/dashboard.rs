//! Dashboard facade over the three collections.
//!
//! # Responsibility
//! - Build every collection from one clock and one validated config.
//! - Route host ticks to all timer owners.
//! - Load the sample workspace shown on first launch.

use crate::clock::{local_timestamp, SharedClock, SystemClock, Timestamp};
use crate::config::{ConfigResult, EngineConfig};
use crate::model::chat::ChatThread;
use crate::model::task::{NewTask, Priority, Task};
use crate::service::chat_engine::ChatEngine;
use crate::service::note_collection::NoteCollection;
use crate::service::task_collection::TaskCollection;
use chrono::{NaiveDate, TimeDelta};
use log::{debug, info};
use std::rc::Rc;

/// Timers fired by one [`Dashboard::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub chat_timers: usize,
    pub autosaves: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.chat_timers == 0 && self.autosaves == 0
    }
}

pub struct Dashboard {
    clock: SharedClock,
    config: EngineConfig,
    pub tasks: TaskCollection,
    pub notes: NoteCollection,
    pub chat: ChatEngine,
}

impl Dashboard {
    /// # Errors
    /// - `ConfigError::Invalid` when `config` fails validation.
    pub fn new(clock: SharedClock, config: EngineConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            tasks: TaskCollection::new(Rc::clone(&clock)),
            notes: NoteCollection::with_config(Rc::clone(&clock), &config),
            chat: ChatEngine::with_config(Rc::clone(&clock), &config),
            clock,
            config,
        })
    }

    /// Dashboard on the system clock.
    pub fn with_system_clock(config: EngineConfig) -> ConfigResult<Self> {
        Self::new(Rc::new(SystemClock), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Fires every chat timer and auto-save due at the clock's current time.
    pub fn tick(&mut self) -> TickReport {
        let report = TickReport {
            chat_timers: self.chat.tick(),
            autosaves: self.notes.tick(),
        };
        if !report.is_idle() {
            debug!(
                "event=tick module=dashboard status=ok chat_timers={} autosaves={}",
                report.chat_timers, report.autosaves
            );
        }
        report
    }

    /// Earliest pending timer across all collections.
    pub fn next_due(&self) -> Option<Timestamp> {
        match (self.chat.next_timer_due(), self.notes.next_autosave_due()) {
            (Some(chat), Some(notes)) => Some(chat.min(notes)),
            (chat, notes) => chat.or(notes),
        }
    }

    /// Seeds the sample tasks and chat threads of a fresh workspace.
    pub fn load_sample_data(&mut self) {
        let now = self.clock.now();
        let samples = [
            (
                "Complete React project",
                "Finish the task management component with all required features",
                (2024, 1, 15),
                Priority::High,
                false,
                (2024, 1, 10),
            ),
            (
                "Study for algorithms exam",
                "Review sorting algorithms and data structures",
                (2024, 1, 20),
                Priority::Medium,
                false,
                (2024, 1, 12),
            ),
            (
                "Buy groceries",
                "",
                (2024, 1, 14),
                Priority::Low,
                true,
                (2024, 1, 13),
            ),
        ];
        for (title, description, (y, m, d), priority, completed, (cy, cm, cd)) in samples {
            let created_at = local_timestamp(cy, cm, cd, 0, 0, 0).unwrap_or(now);
            let mut input = NewTask::titled(title).priority(priority);
            if let Some(due) = NaiveDate::from_ymd_opt(y, m, d) {
                input = input.due(due);
            }
            if !description.is_empty() {
                input = input.description(description);
            }
            if let Ok(mut task) = Task::create(input, created_at) {
                task.completed = completed;
                self.tasks.insert(task);
            }
        }

        let threads = [
            ("Current Conversation", 0),
            ("Help with React Hooks", 1),
            ("CSS Grid Layout Questions", 2),
        ];
        for (title, days_ago) in threads {
            self.chat
                .insert_thread(ChatThread::new(title, now - TimeDelta::days(days_ago)));
        }
        info!(
            "event=sample_load module=dashboard status=ok tasks={} threads={}",
            self.tasks.len(),
            self.chat.threads().len()
        );
    }
}
