//! Pure view derivation: filter, sort, bucket and badge projections.
//!
//! # Responsibility
//! - Turn collection state plus query parameters into ordered projections.
//! - Stay free of side effects so every render pass can recompute.
//!
//! # Invariants
//! - Nothing in this module mutates its inputs.
//! - Results depend only on inputs and the supplied `now`/`today`.

pub mod badge;
pub mod filter;
pub mod recency;
pub mod sort;
pub mod tag_index;
