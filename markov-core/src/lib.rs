//! Word-level Markov chain text generation library.
//!
//! This crate provides:
//! - An order-2 Markov chain over interned tokens
//! - Incremental and parallel training from tokenized lines
//! - Deterministic weighted generation driven by a caller-supplied RNG
//! - A compact, validated snapshot format for persistence
//!
//! Training needs exclusive access to a `Chain`; generation only borrows it,
//! so a loaded chain can serve any number of concurrent readers.

/// Chain model, statistics, training and snapshots.
pub mod model;

/// Errors raised while reading or writing snapshots.
pub mod error;

/// Line and token helpers, atomic file writes.
pub mod io;

pub use error::ChainError;
pub use model::chain::{Chain, ORDER, Prefix};
pub use model::suffix::Suffix;
pub use model::token_table::{SENTINEL, TokenId, TokenTable};
