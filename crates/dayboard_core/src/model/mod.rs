//! Domain records for the three dashboard collections.
//!
//! # Responsibility
//! - Define tasks, notes and chat threads as plain owned data.
//! - Keep input normalization next to the record it protects.
//!
//! # Invariants
//! - Every record is identified by a v4 `Uuid` that is never reused.
//! - Deletion removes records; there are no tombstones.

pub mod chat;
pub mod note;
pub mod task;
