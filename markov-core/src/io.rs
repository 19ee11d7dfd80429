use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Splits a line into whitespace-separated fields.
///
/// Never yields an empty token.
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
	line.split_whitespace()
}

/// Reads every line of `reader` into memory.
///
/// - Splits on `\n` / `\r\n`
/// - Fails on the first read error or invalid UTF-8
pub fn read_lines<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
	reader.lines().collect()
}

/// Builds the sibling path used while a file is being replaced.
///
/// Example:
/// `data/model.bin` → `data/.model.bin.tmp`
pub(crate) fn temporary_path<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
	let path = path.as_ref();

	let parent = path.parent().unwrap_or_else(|| Path::new("."));
	let file_name = path
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Output path has no filename"))?;

	let mut temporary = PathBuf::from(parent);
	temporary.push(format!(".{}.tmp", file_name.to_string_lossy()));
	Ok(temporary)
}

/// Writes `bytes` to `path` as a single unit.
///
/// The data goes to a temporary sibling first and is renamed over `path`
/// once flushed, so readers see either the old file or the new one.
pub(crate) fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
	let temporary = temporary_path(&path)?;

	let result = (|| {
		let mut file = File::create(&temporary)?;
		file.write_all(bytes)?;
		file.sync_all()?;
		fs::rename(&temporary, &path)
	})();

	if result.is_err() {
		let _ = fs::remove_file(&temporary);
	}
	result
}
