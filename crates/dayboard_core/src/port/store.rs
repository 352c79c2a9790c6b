//! Persistence ports for task and note collections.
//!
//! # Responsibility
//! - Define the narrow save/remove contract collections mirror writes to.
//! - Ship an in-memory implementation for tests and the CLI demo.
//!
//! # Invariants
//! - `save_*` is an upsert keyed by record id.
//! - `remove_*` for an unknown id succeeds (idempotent delete).

use crate::model::note::{Note, NoteId};
use crate::model::task::{Task, TaskId};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend cannot be reached right now.
    Unavailable(String),
    /// Backend refused one record.
    Rejected {
        entity: &'static str,
        id: Uuid,
        reason: String,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
            Self::Rejected { entity, id, reason } => {
                write!(f, "store rejected {entity} {id}: {reason}")
            }
        }
    }
}

impl Error for StoreError {}

/// Write-through persistence contract for tasks.
pub trait TaskStore {
    fn save_task(&mut self, task: &Task) -> StoreResult<()>;
    fn remove_task(&mut self, id: TaskId) -> StoreResult<()>;
}

/// Write-through persistence contract for notes.
pub trait NoteStore {
    fn save_note(&mut self, note: &Note) -> StoreResult<()>;
    fn remove_note(&mut self, id: NoteId) -> StoreResult<()>;
}

/// In-memory store keyed by id.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tasks: BTreeMap<TaskId, Task>,
    notes: BTreeMap<NoteId, Note>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a new store in a shared handle so callers can inspect it while
    /// a collection writes through it.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Number of successful save/remove calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl TaskStore for MemoryStore {
    fn save_task(&mut self, task: &Task) -> StoreResult<()> {
        self.tasks.insert(task.id, task.clone());
        self.writes += 1;
        Ok(())
    }

    fn remove_task(&mut self, id: TaskId) -> StoreResult<()> {
        self.tasks.remove(&id);
        self.writes += 1;
        Ok(())
    }
}

impl NoteStore for MemoryStore {
    fn save_note(&mut self, note: &Note) -> StoreResult<()> {
        self.notes.insert(note.id, note.clone());
        self.writes += 1;
        Ok(())
    }

    fn remove_note(&mut self, id: NoteId) -> StoreResult<()> {
        self.notes.remove(&id);
        self.writes += 1;
        Ok(())
    }
}

impl<S: TaskStore> TaskStore for Rc<RefCell<S>> {
    fn save_task(&mut self, task: &Task) -> StoreResult<()> {
        self.borrow_mut().save_task(task)
    }

    fn remove_task(&mut self, id: TaskId) -> StoreResult<()> {
        self.borrow_mut().remove_task(id)
    }
}

impl<S: NoteStore> NoteStore for Rc<RefCell<S>> {
    fn save_note(&mut self, note: &Note) -> StoreResult<()> {
        self.borrow_mut().save_note(note)
    }

    fn remove_note(&mut self, id: NoteId) -> StoreResult<()> {
        self.borrow_mut().remove_note(id)
    }
}
