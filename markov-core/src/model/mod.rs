//! Top-level module for the interned-token Markov chain.
//!
//! This module provides:
//! - The token table mapping strings to compact ids (`TokenTable`)
//! - Per-prefix continuation statistics (`Suffix`)
//! - The order-2 chain with build, generate and merge (`Chain`)
//! - Chunked parallel training (`trainer`)
//! - The persisted snapshot format (`snapshot`)

/// Order-2 chain keyed by interned prefixes.
///
/// Handles sequence ingestion, weighted generation and merging.
pub mod chain;

/// Continuation counts of a single prefix and the weighted walk over them.
pub mod suffix;

/// Append-only string <=> id table with a reserved sentinel.
pub mod token_table;

/// Line-oriented training, sequential or spread over threads.
pub mod trainer;

/// `postcard` snapshot of a chain (encode, decode, atomic save, load).
pub mod snapshot;
