use rustc_hash::FxHashMap;

use crate::error::ChainError;

/// Identifier of an interned token.
pub type TokenId = u32;

/// Reserved identifier marking the start or the end of a sequence.
pub const SENTINEL: TokenId = 0;

/// Append-only bijection between token strings and small integer ids.
///
/// Slot 0 always holds the empty string, which stands for the sentinel.
/// A whitespace split never yields an empty field, so no real token can
/// collide with it.
///
/// ## Invariants
/// - `tokens[0] == ""`
/// - `tokens` only grows; an id never changes meaning
/// - `index` is the exact inverse of `tokens`
#[derive(Clone, Debug)]
pub struct TokenTable {
	/// Token strings, addressed by id.
	tokens: Vec<String>,
	/// Reverse lookup, derived from `tokens`. Never persisted.
	index: FxHashMap<String, TokenId>,
}

impl Default for TokenTable {
	fn default() -> Self {
		Self::new()
	}
}

impl TokenTable {
	/// Creates a table holding only the sentinel.
	pub fn new() -> Self {
		let mut index = FxHashMap::default();
		index.insert(String::new(), SENTINEL);
		Self { tokens: vec![String::new()], index }
	}

	/// Rebuilds a table from its persisted token list.
	///
	/// The reverse index is reconstructed eagerly, so the table is ready
	/// for interning as soon as it is returned.
	///
	/// # Errors
	/// Returns `ChainError::Corrupt` if slot 0 is not the sentinel or if a
	/// token appears twice.
	pub fn from_tokens(tokens: Vec<String>) -> Result<Self, ChainError> {
		match tokens.first() {
			Some(first) if first.is_empty() => (),
			_ => return Err(ChainError::Corrupt("token table does not start with the sentinel".to_owned())),
		}

		let mut index = FxHashMap::with_capacity_and_hasher(tokens.len(), Default::default());
		for (id, token) in tokens.iter().enumerate() {
			if index.insert(token.clone(), id as TokenId).is_some() {
				return Err(ChainError::Corrupt(format!("token {token:?} appears twice")));
			}
		}

		Ok(Self { tokens, index })
	}

	/// Returns the id of `token`, appending it first if it is new.
	pub fn intern(&mut self, token: &str) -> TokenId {
		if let Some(&id) = self.index.get(token) {
			return id;
		}

		let id = self.tokens.len() as TokenId;
		self.tokens.push(token.to_owned());
		self.index.insert(token.to_owned(), id);
		id
	}

	/// Looks up an already interned token.
	pub fn get(&self, token: &str) -> Option<TokenId> {
		self.index.get(token).copied()
	}

	/// Returns the string behind `id`.
	pub fn resolve(&self, id: TokenId) -> Option<&str> {
		self.tokens.get(id as usize).map(String::as_str)
	}

	/// Number of entries, sentinel included.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	/// Always false: the sentinel is present from construction.
	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Iterates over `(id, token)` pairs in id order.
	pub fn iter(&self) -> impl Iterator<Item = (TokenId, &str)> {
		self.tokens.iter().enumerate().map(|(id, token)| (id as TokenId, token.as_str()))
	}

	/// The authoritative, persisted part of the table.
	pub(crate) fn as_slice(&self) -> &[String] {
		&self.tokens
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_table_holds_only_the_sentinel() {
		let table = TokenTable::new();
		assert_eq!(table.len(), 1);
		assert_eq!(table.resolve(SENTINEL), Some(""));
		assert_eq!(table.get(""), Some(SENTINEL));
	}

	#[test]
	fn intern_assigns_sequential_ids_and_reuses_them() {
		let mut table = TokenTable::new();
		assert_eq!(table.intern("the"), 1);
		assert_eq!(table.intern("cat"), 2);
		assert_eq!(table.intern("the"), 1);
		assert_eq!(table.len(), 3);
		assert_eq!(table.resolve(2), Some("cat"));
		assert_eq!(table.resolve(3), None);
	}

	#[test]
	fn real_tokens_never_get_the_sentinel_id() {
		let mut table = TokenTable::new();
		for word in "a b c a b d".split_whitespace() {
			assert_ne!(table.intern(word), SENTINEL);
		}
	}

	#[test]
	fn from_tokens_rebuilds_the_index() {
		let tokens = vec![String::new(), "x".to_owned(), "y".to_owned()];
		let mut table = TokenTable::from_tokens(tokens).unwrap();
		assert_eq!(table.get("y"), Some(2));
		assert_eq!(table.intern("x"), 1);
		assert_eq!(table.intern("z"), 3);
	}

	#[test]
	fn from_tokens_rejects_bad_lists() {
		assert!(TokenTable::from_tokens(Vec::new()).is_err());
		assert!(TokenTable::from_tokens(vec!["x".to_owned()]).is_err());
		let duplicated = vec![String::new(), "x".to_owned(), "x".to_owned()];
		assert!(matches!(TokenTable::from_tokens(duplicated), Err(ChainError::Corrupt(_))));
	}
}
