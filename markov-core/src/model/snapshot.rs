use std::path::Path;

use log::info;
use rustc_hash::FxHashMap;

use serde::{Deserialize, Serialize};

use super::chain::{Chain, Prefix};
use super::suffix::Suffix;
use super::token_table::TokenTable;
use crate::error::ChainError;
use crate::io;

/// Leading bytes of every snapshot.
pub const MAGIC: [u8; 4] = *b"MKV2";

/// Current snapshot layout.
pub const VERSION: u16 = 1;

/// zstd level applied to the encoded snapshot.
pub const COMPRESSION_LEVEL: i32 = 10;

/// Wire form of a persisted chain.
///
/// Only the ordered token list and the statistics are stored; the token
/// index is rebuilt on load. Entries are sorted by prefix so that equal
/// chains encode to equal bytes. The `postcard` encoding of this struct is
/// wrapped in a single zstd frame.
#[derive(Serialize, Deserialize)]
struct Snapshot<T, E> {
	magic: [u8; 4],
	version: u16,
	tokens: T,
	table: E,
}

/// Compresses an encoded snapshot.
fn compress(payload: &[u8]) -> Result<Vec<u8>, ChainError> {
	zstd::encode_all(payload, COMPRESSION_LEVEL).map_err(ChainError::Compression)
}

/// Inflates bytes produced by `compress`.
fn decompress(bytes: &[u8]) -> Result<Vec<u8>, ChainError> {
	zstd::decode_all(bytes).map_err(ChainError::Compression)
}

impl Chain {
	/// Encodes the whole chain with `postcard`, without compression.
	fn to_payload(&self) -> Result<Vec<u8>, ChainError> {
		let mut table: Vec<(&Prefix, &Suffix)> = self.iter().collect();
		table.sort_unstable_by_key(|(prefix, _)| **prefix);

		let snapshot = Snapshot {
			magic: MAGIC,
			version: VERSION,
			tokens: self.tokens().as_slice(),
			table,
		};
		Ok(postcard::to_stdvec(&snapshot)?)
	}

	/// Encodes the whole chain with `postcard` and compresses it with zstd.
	///
	/// # Errors
	/// Returns `ChainError::Codec` or `ChainError::Compression` if encoding fails.
	pub fn to_bytes(&self) -> Result<Vec<u8>, ChainError> {
		compress(&self.to_payload()?)
	}

	/// Decodes a chain produced by `to_bytes` and validates it.
	///
	/// The returned chain is ready for both `build` and `generate`.
	///
	/// # Errors
	/// - `ChainError::Compression` if the bytes are not a zstd frame
	/// - `ChainError::Codec` if the payload is not a snapshot
	/// - `ChainError::BadMagic` / `ChainError::UnsupportedVersion` on a header mismatch
	/// - `ChainError::Corrupt` if the content breaks a chain invariant
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
		Self::from_payload(&decompress(bytes)?)
	}

	fn from_payload(payload: &[u8]) -> Result<Self, ChainError> {
		let snapshot: Snapshot<Vec<String>, Vec<(Prefix, Suffix)>> = postcard::from_bytes(payload)?;
		if snapshot.magic != MAGIC {
			return Err(ChainError::BadMagic(snapshot.magic));
		}
		if snapshot.version != VERSION {
			return Err(ChainError::UnsupportedVersion { found: snapshot.version, expected: VERSION });
		}

		let tokens = TokenTable::from_tokens(snapshot.tokens)?;

		let mut table = FxHashMap::with_capacity_and_hasher(snapshot.table.len(), Default::default());
		for (prefix, suffix) in snapshot.table {
			if table.insert(prefix, suffix).is_some() {
				return Err(ChainError::Corrupt(format!("prefix {:?} appears twice", prefix.0)));
			}
		}

		let chain = Chain::from_parts(tokens, table);
		chain.check()?;
		Ok(chain)
	}

	/// Writes the chain to `path`, replacing any previous file atomically.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ChainError> {
		let bytes = self.to_bytes()?;
		io::write_atomic(&path, &bytes)?;
		info!(
			"Saved chain to {} ({} tokens, {} prefixes, {} bytes)",
			path.as_ref().display(),
			self.tokens().len(),
			self.len(),
			bytes.len()
		);
		Ok(())
	}

	/// Reads a chain previously written by `save`.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ChainError> {
		let bytes = std::fs::read(&path)?;
		let chain = Self::from_bytes(&bytes)?;
		info!(
			"Loaded chain from {} ({} tokens, {} prefixes)",
			path.as_ref().display(),
			chain.tokens().len(),
			chain.len()
		);
		Ok(chain)
	}
}
