use thiserror::Error;

/// Errors raised by the snapshot layer.
///
/// Training and generation are infallible; only reading and writing a
/// persisted chain can fail.
#[derive(Debug, Error)]
pub enum ChainError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("snapshot encoding error: {0}")]
	Codec(#[from] postcard::Error),

	#[error("snapshot decompression error: {0}")]
	Compression(std::io::Error),

	#[error("not a chain snapshot (bad magic {0:?})")]
	BadMagic([u8; 4]),

	#[error("unsupported snapshot version {found} (expected {expected})")]
	UnsupportedVersion { found: u16, expected: u16 },

	#[error("corrupt snapshot: {0}")]
	Corrupt(String),
}
