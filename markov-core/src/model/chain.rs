use rand::Rng;
use rustc_hash::FxHashMap;

use serde::{Deserialize, Serialize};

use super::suffix::Suffix;
use super::token_table::{SENTINEL, TokenId, TokenTable};
use crate::error::ChainError;

/// Markov order: number of tokens in a prefix.
pub const ORDER: usize = 2;

/// Lookup key of the chain: the last `ORDER` token ids.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix(pub [TokenId; ORDER]);

impl Prefix {
	/// Start of a sequence: every slot holds the sentinel.
	pub const START: Prefix = Prefix([SENTINEL; ORDER]);

	/// Drops the oldest id and appends `next`.
	pub fn shift(self, next: TokenId) -> Self {
		let mut ids = self.0;
		ids.rotate_left(1);
		ids[ORDER - 1] = next;
		Prefix(ids)
	}
}

/// Order-2 Markov chain over interned tokens.
///
/// The `Chain` maps each observed prefix to the distribution of tokens
/// that followed it, and walks that distribution to produce new text.
///
/// # Responsibilities
/// - Accumulate prefix => next token statistics from token sequences
/// - Generate sequences by weighted random walk
/// - Merge with another chain trained separately
///
/// # Invariants
/// - Every id stored in `table` is a valid index into `tokens`
/// - Every suffix satisfies `total == Σ counts`
///
/// Training needs `&mut self`, generation only `&self`: a trained chain can
/// be shared between any number of readers.
#[derive(Clone, Debug, Default)]
pub struct Chain {
	/// Interned token strings.
	tokens: TokenTable,
	/// Prefix => observed continuations.
	table: FxHashMap<Prefix, Suffix>,
}

impl Chain {
	/// Creates an empty chain.
	pub fn new() -> Self {
		Self::default()
	}

	/// Assembles a chain from already validated parts.
	pub(crate) fn from_parts(tokens: TokenTable, table: FxHashMap<Prefix, Suffix>) -> Self {
		Self { tokens, table }
	}

	/// Adds one token sequence (a line, a sentence, a document) to the chain.
	///
	/// The rolling prefix starts at `Prefix::START` on every call, so each
	/// call is an independent sequence. After the last token the sentinel
	/// is observed once, recording where the sequence ended.
	///
	/// Empty strings are skipped: they would alias the sentinel.
	pub fn build<I, S>(&mut self, tokens: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut prefix = Prefix::START;
		for token in tokens {
			let token = token.as_ref();
			if token.is_empty() {
				continue;
			}
			let id = self.tokens.intern(token);
			self.increment(prefix, id);
			prefix = prefix.shift(id);
		}

		self.increment(prefix, SENTINEL);
	}

	fn increment(&mut self, prefix: Prefix, next: TokenId) {
		self.table.entry(prefix).or_default().observe(next);
	}

	/// Generates at most `max` tokens by weighted random walk.
	///
	/// The walk starts at `Prefix::START` and stops early when the current
	/// prefix was never continued during training, or when the sentinel
	/// is drawn. Identical chains and identical `rng` states give
	/// identical output.
	pub fn generate<R: Rng + ?Sized>(&self, max: usize, rng: &mut R) -> Vec<String> {
		self.generate_ids(max, rng)
			.into_iter()
			.filter_map(|id| self.tokens.resolve(id))
			.map(str::to_owned)
			.collect()
	}

	/// Same walk as `generate`, joined with single spaces.
	pub fn generate_text<R: Rng + ?Sized>(&self, max: usize, rng: &mut R) -> String {
		self.generate(max, rng).join(" ")
	}

	/// Same walk as `generate`, returning token ids.
	pub fn generate_ids<R: Rng + ?Sized>(&self, max: usize, rng: &mut R) -> Vec<TokenId> {
		let mut ids = Vec::new();
		let mut prefix = Prefix::START;

		for _ in 0..max {
			let next = match self.table.get(&prefix).and_then(|suffix| suffix.sample(&mut *rng)) {
				Some(id) if id != SENTINEL => id,
				_ => break,
			};
			ids.push(next);
			prefix = prefix.shift(next);
		}

		ids
	}

	/// Merges another chain into this one.
	///
	/// Tokens of `other` are interned here in `other`'s id order, then all
	/// of its observations are added. The result is the chain obtained by
	/// training `self` and then `other` on their respective sequences.
	pub fn merge(&mut self, other: &Self) {
		let remap: Vec<TokenId> = other.tokens.iter().map(|(_, token)| self.tokens.intern(token)).collect();

		for (prefix, suffix) in &other.table {
			let key = Prefix(prefix.0.map(|id| remap[id as usize]));
			let target = self.table.entry(key).or_default();
			for (next, count) in suffix.iter() {
				target.observe_n(remap[next as usize], count);
			}
		}
	}

	/// Returns the continuations observed after `prefix`.
	pub fn suffix(&self, prefix: &Prefix) -> Option<&Suffix> {
		self.table.get(prefix)
	}

	/// Builds the prefix key for the given tokens.
	///
	/// `""` stands for the sentinel. Returns `None` if a token is unknown.
	pub fn prefix_of(&self, tokens: [&str; ORDER]) -> Option<Prefix> {
		let mut ids = [SENTINEL; ORDER];
		for (slot, token) in ids.iter_mut().zip(tokens) {
			*slot = self.tokens.get(token)?;
		}
		Some(Prefix(ids))
	}

	/// Iterates over all `(prefix, suffix)` entries, in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = (&Prefix, &Suffix)> {
		self.table.iter()
	}

	/// Interned tokens.
	pub fn tokens(&self) -> &TokenTable {
		&self.tokens
	}

	/// Number of distinct prefixes.
	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	/// Total number of observations across all prefixes.
	pub fn observations(&self) -> u64 {
		self.table.values().map(Suffix::total).sum()
	}

	/// Verifies the structural invariants of the chain.
	///
	/// # Errors
	/// Returns `ChainError::Corrupt` describing the first violation found.
	pub fn check(&self) -> Result<(), ChainError> {
		if self.tokens.resolve(SENTINEL) != Some("") {
			return Err(ChainError::Corrupt("sentinel slot is not empty".to_owned()));
		}

		let size = self.tokens.len() as u64;
		for (prefix, suffix) in &self.table {
			if prefix.0.iter().any(|&id| id as u64 >= size) {
				return Err(ChainError::Corrupt(format!("prefix {:?} refers to an unknown token", prefix.0)));
			}
			if let Some((next, _)) = suffix.iter().find(|&(next, _)| next as u64 >= size) {
				return Err(ChainError::Corrupt(format!("suffix of {:?} refers to unknown token {next}", prefix.0)));
			}
			if !suffix.is_consistent() {
				return Err(ChainError::Corrupt(format!("suffix of {:?} has inconsistent counts", prefix.0)));
			}
		}

		Ok(())
	}
}
