use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use env_logger::Env;
use log::info;
use markov_core::Chain;
use markov_core::io::read_lines;
use markov_core::model::trainer::{train_into, train_parallel};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Train a word-level Markov chain and generate text from it.
///
/// Text input is read line by line; every line is one training sequence.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// File to read input from (defaults to standard input)
	#[arg(short, long, value_name = "PATH")]
	input: Option<PathBuf>,

	/// File to write output to (defaults to standard output)
	#[arg(short, long, value_name = "PATH")]
	output: Option<PathBuf>,

	/// Write the trained chain as a reusable snapshot instead of generating text
	#[arg(short, long)]
	compile: bool,

	/// Parse the input as a snapshot instead of training on it
	#[arg(short, long)]
	precompiled: bool,

	/// Extra text files to train on after the input is read (repeatable)
	#[arg(long = "train", value_name = "PATH")]
	train: Vec<PathBuf>,

	/// Number of lines of text to generate
	#[arg(short = 'n', long, default_value_t = 5)]
	lines: usize,

	/// Maximum number of tokens per generated line
	#[arg(long, default_value_t = 100)]
	max_tokens: usize,

	/// Random seed (defaults to the current time)
	#[arg(long)]
	seed: Option<u64>,

	/// Training threads (0 = one per CPU)
	#[arg(short, long, default_value_t = 0)]
	jobs: usize,

	/// Increase verbosity (-v, -vv)
	#[arg(short = 'v', long, action = ArgAction::Count)]
	verbose: u8,
}

fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

fn open_input(args: &Args) -> Result<Box<dyn BufRead>> {
	Ok(match &args.input {
		Some(path) => {
			let file = File::open(path).with_context(|| format!("error while opening -i file {}", path.display()))?;
			Box::new(BufReader::new(file))
		}
		None => Box::new(BufReader::new(io::stdin())),
	})
}

fn open_output(args: &Args) -> Result<Box<dyn Write>> {
	Ok(match &args.output {
		Some(path) => {
			let file = File::create(path).with_context(|| format!("error while opening -o file {}", path.display()))?;
			Box::new(BufWriter::new(file))
		}
		None => Box::new(BufWriter::new(io::stdout())),
	})
}

/// Builds the chain from the input: decoded from a snapshot or trained on text.
fn read_chain(args: &Args) -> Result<Chain> {
	let mut input = open_input(args)?;

	let mut chain = if args.precompiled {
		let mut bytes = Vec::new();
		input.read_to_end(&mut bytes).context("error while reading precompiled input")?;
		Chain::from_bytes(&bytes).context("error while reading precompiled input")?
	} else {
		let lines = read_lines(input).context("error while reading input")?;
		train_parallel(&lines, args.jobs)
	};

	for path in &args.train {
		let file = File::open(path).with_context(|| format!("error while opening training file {}", path.display()))?;
		let lines = read_lines(BufReader::new(file)).with_context(|| format!("error while reading {}", path.display()))?;
		train_into(&mut chain, &lines);
		info!("Trained on {} ({} lines)", path.display(), lines.len());
	}

	Ok(chain)
}

fn run(args: &Args) -> Result<()> {
	let chain = read_chain(args)?;

	if args.compile {
		match &args.output {
			Some(path) => chain.save(path).context("error while writing compiled file")?,
			None => {
				let bytes = chain.to_bytes().context("error while writing compiled file")?;
				io::stdout().lock().write_all(&bytes).context("error while writing compiled file")?;
			}
		}
		return Ok(());
	}

	let seed = args.seed.unwrap_or_else(time_seed);
	info!("Generating {} lines with seed {}", args.lines, seed);

	let mut rng = StdRng::seed_from_u64(seed);
	let mut output = open_output(args)?;
	for _ in 0..args.lines {
		writeln!(output, "{}", chain.generate_text(args.max_tokens, &mut rng))?;
	}
	output.flush()?;

	Ok(())
}

fn time_seed() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_nanos() as u64)
		.unwrap_or_default()
}

fn main() -> Result<()> {
	let args = Args::parse();
	init_logging(args.verbose);
	run(&args)
}
