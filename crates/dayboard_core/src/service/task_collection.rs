//! Task collection use-cases.
//!
//! # Responsibility
//! - Own the task list and apply create/update/toggle/delete intents.
//! - Derive the filtered, sorted task view with category badge counts.
//!
//! # Invariants
//! - New tasks are appended; storage order is creation order.
//! - Unknown ids are ignored and reported as `false`, never as errors.
//! - Category counts always cover the whole collection, ignoring search.
//! - A store failure is logged; in-memory state stays authoritative.

use crate::clock::SharedClock;
use crate::model::task::{NewTask, Task, TaskId, TaskPatch, TaskValidationError};
use crate::port::store::TaskStore;
use crate::view::badge::{due_status, DueStatus};
use crate::view::filter::{task_in_category, task_matches, TaskCategory, TaskQuery};
use crate::view::sort::sort_tasks;
use log::{debug, info, warn};

/// Badge counts per task category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub all: usize,
    pub today: usize,
    pub upcoming: usize,
    pub completed: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: TaskCategory) -> usize {
        match category {
            TaskCategory::All => self.all,
            TaskCategory::Today => self.today,
            TaskCategory::Upcoming => self.upcoming,
            TaskCategory::Completed => self.completed,
        }
    }
}

/// One visible task with its due badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCard<'a> {
    pub task: &'a Task,
    pub due_status: Option<DueStatus>,
}

/// Derived task list for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView<'a> {
    pub items: Vec<TaskCard<'a>>,
    pub counts: CategoryCounts,
}

impl TaskView<'_> {
    pub fn ids(&self) -> Vec<TaskId> {
        self.items.iter().map(|card| card.task.id).collect()
    }
}

/// In-memory task collection with an optional write-through store.
pub struct TaskCollection {
    clock: SharedClock,
    tasks: Vec<Task>,
    store: Option<Box<dyn TaskStore>>,
}

impl TaskCollection {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            tasks: Vec::new(),
            store: None,
        }
    }

    /// Mirrors every successful mutation to `store`.
    pub fn set_store(&mut self, store: impl TaskStore + 'static) {
        self.store = Some(Box::new(store));
    }

    /// Creates and appends one task.
    ///
    /// # Errors
    /// - `EmptyTitle` when the trimmed title is empty; nothing changes.
    pub fn create(&mut self, input: NewTask) -> Result<Task, TaskValidationError> {
        let task = match Task::create(input, self.clock.now()) {
            Ok(task) => task,
            Err(err) => {
                debug!("event=task_create module=tasks status=rejected reason={err}");
                return Err(err);
            }
        };
        self.tasks.push(task.clone());
        info!(
            "event=task_create module=tasks status=ok task_id={} total={}",
            task.id,
            self.tasks.len()
        );
        self.persist(&task);
        Ok(task)
    }

    /// Adds an already built task, e.g. one restored from a store. Returns
    /// `false` when the id is already present.
    pub fn insert(&mut self, task: Task) -> bool {
        if self.get(task.id).is_some() {
            debug!("event=task_insert module=tasks status=ignored task_id={}", task.id);
            return false;
        }
        self.tasks.push(task);
        true
    }

    /// Merges `patch` into the task `id`.
    ///
    /// Returns `Ok(false)` for an unknown id.
    ///
    /// # Errors
    /// - `EmptyTitle` when the patch title trims to empty; the task is
    ///   left unchanged.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> Result<bool, TaskValidationError> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("event=task_update module=tasks status=ignored task_id={id}");
            return Ok(false);
        };
        task.apply(patch)?;
        let snapshot = task.clone();
        info!("event=task_update module=tasks status=ok task_id={id}");
        self.persist(&snapshot);
        Ok(true)
    }

    /// Flips the completed flag. Returns `false` for an unknown id.
    pub fn toggle_complete(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("event=task_toggle module=tasks status=ignored task_id={id}");
            return false;
        };
        task.completed = !task.completed;
        let snapshot = task.clone();
        info!(
            "event=task_toggle module=tasks status=ok task_id={id} completed={}",
            snapshot.completed
        );
        self.persist(&snapshot);
        true
    }

    /// Removes the task. Deleting an absent id is a no-op returning `false`.
    pub fn delete(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            debug!("event=task_delete module=tasks status=ignored task_id={id}");
            return false;
        }
        info!(
            "event=task_delete module=tasks status=ok task_id={id} total={}",
            self.tasks.len()
        );
        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.remove_task(id) {
                warn!("event=task_store_remove module=tasks status=error task_id={id} error={err}");
            }
        }
        true
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Category badge counts over the whole collection.
    pub fn counts(&self) -> CategoryCounts {
        let today = self.clock.now().date_naive();
        let count = |category: TaskCategory| {
            self.tasks
                .iter()
                .filter(|task| task_in_category(task, category, today))
                .count()
        };
        CategoryCounts {
            all: self.tasks.len(),
            today: count(TaskCategory::Today),
            upcoming: count(TaskCategory::Upcoming),
            completed: count(TaskCategory::Completed),
        }
    }

    /// Filter, then sort, then attach due badges.
    pub fn view(&self, query: &TaskQuery) -> TaskView<'_> {
        let today = self.clock.now().date_naive();
        let visible = self
            .tasks
            .iter()
            .filter(|task| task_matches(task, query, today));
        let items = sort_tasks(visible, query.sort)
            .into_iter()
            .map(|task| TaskCard {
                task,
                due_status: due_status(task.due_date, today),
            })
            .collect();
        TaskView {
            items,
            counts: self.counts(),
        }
    }

    fn persist(&mut self, task: &Task) {
        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.save_task(task) {
                warn!(
                    "event=task_store_save module=tasks status=error task_id={} error={err}",
                    task.id
                );
            }
        }
    }
}
