//! Chain integration tests: training, generation and snapshot round-trips.

use markov_core::io::tokenize;
use markov_core::model::trainer::{train, train_into, train_parallel};
use markov_core::{Chain, ChainError, Prefix, SENTINEL};
use rand::SeedableRng;
use rand::rngs::StdRng;

const CORPUS: &str = "\
The river runs past the old mill and the river turns the wheel.
The mill grinds the grain and the grain becomes flour.
Flour goes to the baker and the baker makes the bread.
The bread goes to the market and the market feeds the town.
The town sits by the river and the river runs to the sea.
At night the mill is quiet and the river runs on.
";

fn corpus_lines() -> Vec<&'static str> {
	CORPUS.lines().collect()
}

fn corpus_chain() -> Chain {
	train(&corpus_lines())
}

fn assert_consistent(chain: &Chain) {
	for (prefix, suffix) in chain.iter() {
		let sum: u64 = suffix.iter().map(|(_, count)| count).sum();
		assert_eq!(suffix.total(), sum, "prefix {:?}", prefix);
	}
	assert!(chain.check().is_ok());
}

#[test]
fn worked_example_from_six_tokens() {
	let mut chain = Chain::new();
	chain.build(["the", "cat", "sat", "the", "cat", "ran"]);

	let the_cat = chain.prefix_of(["the", "cat"]).unwrap();
	let suffix = chain.suffix(&the_cat).unwrap();
	assert_eq!(suffix.total(), 2);
	assert_eq!(suffix.get(chain.tokens().get("sat").unwrap()), 1);
	assert_eq!(suffix.get(chain.tokens().get("ran").unwrap()), 1);

	// Only "the" ever follows the start prefix, so draw 0 is "the".
	let start = chain.suffix(&Prefix::START).unwrap();
	assert_eq!(start.pick(0), chain.tokens().get("the"));

	let mut rng = StdRng::seed_from_u64(0);
	let generated = chain.generate(1, &mut rng);
	assert_eq!(generated, ["the"]);
}

#[test]
fn same_seed_same_output() {
	let chain = corpus_chain();
	for seed in [0, 1, 42, u64::MAX] {
		let first = chain.generate_text(200, &mut StdRng::seed_from_u64(seed));
		let second = chain.generate_text(200, &mut StdRng::seed_from_u64(seed));
		assert_eq!(first, second, "seed {seed}");
	}
}

#[test]
fn sentinel_never_reaches_the_output() {
	let chain = corpus_chain();
	assert_eq!(chain.tokens().resolve(SENTINEL), Some(""));
	for seed in 0..200 {
		let words = chain.generate(1000, &mut StdRng::seed_from_u64(seed));
		assert!(words.iter().all(|word| !word.is_empty()), "seed {seed}");
	}
}

#[test]
fn output_length_is_bounded() {
	let chain = corpus_chain();
	let mut rng = StdRng::seed_from_u64(9);
	assert!(chain.generate(0, &mut rng).is_empty());
	for max in [1, 2, 5, 17] {
		assert!(chain.generate(max, &mut rng).len() <= max);
	}
}

#[test]
fn generated_text_follows_observed_transitions() {
	let chain = corpus_chain();
	for seed in 0..50 {
		let ids = chain.generate_ids(500, &mut StdRng::seed_from_u64(seed));
		let mut prefix = Prefix::START;
		for id in ids {
			assert!(chain.suffix(&prefix).unwrap().get(id) > 0);
			prefix = prefix.shift(id);
		}
	}
}

#[test]
fn statistics_stay_consistent_and_grow_monotonically() {
	let mut chain = Chain::new();
	for line in corpus_lines() {
		let before: Vec<(Prefix, u64)> = chain.iter().map(|(prefix, suffix)| (*prefix, suffix.total())).collect();
		let tokens_before = chain.tokens().len();

		chain.build(tokenize(line));

		assert_consistent(&chain);
		assert!(chain.tokens().len() >= tokens_before);
		for (prefix, total) in before {
			assert!(chain.suffix(&prefix).unwrap().total() >= total);
		}
	}
}

#[test]
fn snapshot_round_trip_is_behaviorally_equivalent() {
	let chain = corpus_chain();
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("corpus.bin");

	chain.save(&path).unwrap();
	let mut loaded = Chain::load(&path).unwrap();

	for seed in 0..20 {
		assert_eq!(
			chain.generate(300, &mut StdRng::seed_from_u64(seed)),
			loaded.generate(300, &mut StdRng::seed_from_u64(seed)),
		);
	}

	// Continue training both and compare again.
	let mut original = chain.clone();
	let extra = ["the baker sleeps by the sea", "a new wheel turns"];
	train_into(&mut original, &extra);
	train_into(&mut loaded, &extra);
	assert_eq!(original.to_bytes().unwrap(), loaded.to_bytes().unwrap());
}

#[test]
fn training_after_load_equals_training_in_one_go() {
	let lines = corpus_lines();
	let (head, tail) = lines.split_at(3);

	let bytes = train(head).to_bytes().unwrap();
	let mut resumed = Chain::from_bytes(&bytes).unwrap();
	train_into(&mut resumed, tail);

	assert_eq!(resumed.to_bytes().unwrap(), corpus_chain().to_bytes().unwrap());
}

#[test]
fn parallel_training_is_deterministic() {
	let lines = corpus_lines();
	let expected = corpus_chain().to_bytes().unwrap();
	assert_eq!(train_parallel(&lines, 0).to_bytes().unwrap(), expected);
	assert_eq!(train_parallel(&lines, 4).to_bytes().unwrap(), expected);
}

#[test]
fn loading_garbage_fails() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("garbage.bin");
	std::fs::write(&path, b"definitely not a chain").unwrap();
	assert!(Chain::load(&path).is_err());

	let missing = dir.path().join("missing.bin");
	assert!(matches!(Chain::load(&missing), Err(ChainError::Io(_))));
}
