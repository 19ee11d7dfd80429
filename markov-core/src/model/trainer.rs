use std::thread;

use log::{debug, info};

use super::chain::Chain;
use crate::io::tokenize;

/// Trains a chain on `lines`, one `build` call per line, using `jobs` threads.
///
/// # Behavior
/// - Splits the lines into at most `jobs` contiguous slices
///   (`jobs == 0` means one per CPU).
/// - Builds a partial chain for each slice on its own thread.
/// - Merges the partial chains in slice order.
///
/// # Notes
/// - Each `build` call starts from the sentinel prefix, and merging interns
///   unseen tokens in first-occurrence order, so the result is identical to
///   `train` over the same lines.
pub fn train_parallel<S>(lines: &[S], jobs: usize) -> Chain
where
	S: AsRef<str> + Sync,
{
	let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
	if jobs <= 1 || lines.len() < 2 {
		return train(lines);
	}

	let chunk_size = lines.len().div_ceil(jobs);
	info!("Training on {} lines with {} threads", lines.len(), lines.len().div_ceil(chunk_size));

	let partials: Vec<Chain> = thread::scope(|scope| {
		let handles: Vec<_> = lines
			.chunks(chunk_size)
			.map(|chunk| scope.spawn(move || train(chunk)))
			.collect();

		handles
			.into_iter()
			.map(|handle| match handle.join() {
				Ok(chain) => chain,
				Err(panic) => std::panic::resume_unwind(panic),
			})
			.collect()
	});

	let mut partials = partials.into_iter();
	let mut chain = partials.next().unwrap_or_default();
	for (i, partial) in partials.enumerate() {
		debug!("Merging partial chain {} ({} prefixes)", i + 1, partial.len());
		chain.merge(&partial);
	}

	info!("Trained chain: {} tokens, {} prefixes", chain.tokens().len(), chain.len());
	chain
}

/// Trains a chain on `lines` on the calling thread.
pub fn train<S: AsRef<str>>(lines: &[S]) -> Chain {
	let mut chain = Chain::new();
	train_into(&mut chain, lines);
	chain
}

/// Continues training an existing chain, one `build` call per line.
pub fn train_into<S: AsRef<str>>(chain: &mut Chain, lines: &[S]) {
	for line in lines {
		chain.build(tokenize(line.as_ref()));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const LINES: [&str; 6] = [
		"the cat sat on the mat",
		"the dog sat on the log",
		"",
		"a cat and a dog",
		"the mat was red",
		"on the log sat the cat",
	];

	#[test]
	fn parallel_training_matches_sequential_training() {
		let sequential = train(&LINES);
		for jobs in [2, 3, 4, 16] {
			let parallel = train_parallel(&LINES, jobs);
			assert_eq!(parallel.to_bytes().unwrap(), sequential.to_bytes().unwrap(), "jobs = {jobs}");
		}
	}

	#[test]
	fn train_into_continues_an_existing_chain() {
		let mut chain = train(&LINES[..3]);
		train_into(&mut chain, &LINES[3..]);
		assert_eq!(chain.to_bytes().unwrap(), train(&LINES).to_bytes().unwrap());
	}

	#[test]
	fn no_lines_give_an_empty_chain() {
		let lines: [&str; 0] = [];
		assert!(train_parallel(&lines, 4).is_empty());
	}
}
