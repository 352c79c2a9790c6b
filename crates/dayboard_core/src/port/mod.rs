//! Narrow interfaces to external services.
//!
//! # Responsibility
//! - Separate collection logic from persistence, transport and inference.
//! - Keep every port synchronous and `Result`-returning.
//!
//! # Invariants
//! - Collections stay authoritative: a failing port never rolls back
//!   in-memory state.

pub mod chat;
pub mod store;
