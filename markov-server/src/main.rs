use std::path::PathBuf;

use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;
use markov_core::Chain;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Serve text generated from a chain snapshot, one reproducible text per seed.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Chain snapshot written by `markov -c`
	model: PathBuf,

	/// Address to listen on
	#[arg(long, env = "MARKOV_BIND", default_value = "0.0.0.0:20098")]
	bind: String,

	/// Upper bound on the number of tokens per response
	#[arg(long, env = "MARKOV_MAX_TOKENS", default_value_t = 1000)]
	max_tokens: usize,

	/// Number of worker threads (defaults to one per CPU)
	#[arg(long, env = "MARKOV_WORKERS")]
	workers: Option<usize>,
}

/// Per-request generation settings, fixed at startup.
#[derive(Clone, Copy, Debug)]
struct ServeConfig {
	max_tokens: usize,
}

/// Builds the redirect to a freshly drawn seed.
///
/// Seeds are non-negative so the address never starts with a sign.
fn redirect_to_fresh_seed() -> HttpResponse {
	let seed: i64 = rand::rng().random_range(0..=i64::MAX);
	HttpResponse::TemporaryRedirect()
		.insert_header((header::LOCATION, format!("/{seed}")))
		.finish()
}

/// HTTP GET endpoint `/`
///
/// No seed given: redirect to a random one.
#[get("/")]
async fn get_index() -> impl Responder {
	redirect_to_fresh_seed()
}

/// HTTP GET endpoint `/{seed}`
///
/// Returns the text generated for `seed` as a plain body. The same seed
/// always yields the same text for a given chain. A seed that is not an
/// `i64` is answered with a redirect to a random valid one.
#[get("/{seed}")]
async fn get_generated(chain: web::Data<Chain>, config: web::Data<ServeConfig>, seed: web::Path<String>) -> impl Responder {
	let seed = match seed.parse::<i64>() {
		Ok(seed) => seed,
		Err(_) => return redirect_to_fresh_seed(),
	};

	let mut rng = StdRng::seed_from_u64(seed as u64);
	let text = chain.generate_text(config.max_tokens, &mut rng);

	HttpResponse::Ok()
		.content_type("text/plain; charset=utf-8")
		.body(text)
}

/// Fallback for any other path, e.g. `/1/2`: redirect to a random seed.
async fn redirect_unknown() -> impl Responder {
	redirect_to_fresh_seed()
}

/// Registers the service routes.
fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_index)
		.service(get_generated)
		.default_service(web::to(redirect_unknown));
}

/// Main entry point for the server.
///
/// Loads the chain once, shares it read-only with every worker and starts
/// an Actix-web HTTP server. A snapshot that cannot be loaded stops the
/// process before it binds.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

	let args = Args::parse();

	let chain = Chain::load(&args.model).with_context(|| format!("failed to load chain from {}", args.model.display()))?;
	let chain = web::Data::new(chain);
	let config = web::Data::new(ServeConfig { max_tokens: args.max_tokens });

	let mut server = HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.app_data(chain.clone())
			.app_data(config.clone())
			.configure(routes)
	});
	if let Some(workers) = args.workers {
		server = server.workers(workers);
	}

	info!("Now listening on {}...", args.bind);
	server
		.bind(&args.bind)
		.with_context(|| format!("failed to bind {}", args.bind))?
		.run()
		.await?;

	Ok(())
}
