//! Collection use-case services.
//!
//! # Responsibility
//! - Own collection state and apply user intents to it.
//! - Turn state plus query parameters into view models via `crate::view`.
//! - Schedule and fire the delayed transitions of chat and auto-save.

pub mod autosave;
pub mod chat_engine;
pub mod dashboard;
pub mod note_collection;
pub mod task_collection;
