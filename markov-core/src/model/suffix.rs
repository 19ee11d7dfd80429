use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::token_table::TokenId;

/// Observed continuations of one prefix.
///
/// Conceptually a node of the Markov chain whose outgoing edges are
/// weighted by how many times each next token was seen.
///
/// ## Invariants
/// - `total == counts.values().sum()`
/// - every count is strictly positive
/// - both only grow
///
/// `counts` is an ordered map so that a chain read back from a snapshot
/// walks its suffixes in the same order as the chain that wrote it. The
/// sampling itself does not depend on that order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Suffix {
	/// Sum of all observations for this prefix.
	total: u64,
	/// Next token id => number of observations.
	counts: BTreeMap<TokenId, u64>,
}

impl Suffix {
	/// Creates an empty suffix table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `next` after this prefix.
	pub fn observe(&mut self, next: TokenId) {
		self.observe_n(next, 1);
	}

	pub(crate) fn observe_n(&mut self, next: TokenId, count: u64) {
		*self.counts.entry(next).or_insert(0) += count;
		self.total += count;
	}

	/// Sum of all observation counts.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Number of times `next` followed this prefix.
	pub fn get(&self, next: TokenId) -> u64 {
		self.counts.get(&next).copied().unwrap_or(0)
	}

	/// Number of distinct continuations.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Iterates over `(next, count)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (TokenId, u64)> + '_ {
		self.counts.iter().map(|(&id, &count)| (id, count))
	}

	/// Maps a draw `j` in `[0, total)` to the continuation it lands on.
	///
	/// Returns `None` if `j` is out of range.
	pub fn pick(&self, j: u64) -> Option<TokenId> {
		pick_weighted(self.iter(), j)
	}

	/// Draws a continuation with probability `count / total`.
	///
	/// Returns `None` if nothing was ever observed.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<TokenId> {
		if self.total == 0 {
			return None;
		}
		self.pick(rng.random_range(0..self.total))
	}

	/// Checks `total == Σ counts` and that no count is zero.
	///
	/// A sum that does not fit in a `u64` is inconsistent.
	pub(crate) fn is_consistent(&self) -> bool {
		let sum = self.counts.values().try_fold(0u64, |acc, &count| acc.checked_add(count));
		sum == Some(self.total) && self.counts.values().all(|&count| count > 0)
	}
}

/// Cumulative-subtraction walk over weighted entries.
///
/// Each entry owns a disjoint interval of `[0, Σ weights)` whatever the
/// enumeration order, so a uniform `j` selects an entry with probability
/// `weight / Σ weights`.
pub(crate) fn pick_weighted<I>(entries: I, mut j: u64) -> Option<TokenId>
where
	I: IntoIterator<Item = (TokenId, u64)>,
{
	for (id, count) in entries {
		if j < count {
			return Some(id);
		}
		j -= count;
	}
	None
}
