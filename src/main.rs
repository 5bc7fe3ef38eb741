//! # Gold Price Scraper
//!
//! Collects the retail gold price published on the front pages of four
//! Korean gold exchanges and writes them to a single JSON file.
//!
//! ## Usage
//!
//! ```sh
//! gold_price_scraper                    # writes ./gold_price.json
//! RUST_LOG=debug gold_price_scraper     # include selector and charset details
//! ```
//!
//! ## Architecture
//!
//! A single sequential pass, run once per invocation by an external scheduler:
//! 1. **Fetching**: One GET per exchange, with a timeout and no retries
//! 2. **Extraction**: Primary selector, then fallback, then sanitize to `450,000원`
//! 3. **Output**: Print the record and overwrite the JSON file
//!
//! A source that cannot be fetched or read gets a sentinel value instead of a
//! price; no single source can fail the run.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod collector;
mod extract;
mod fetcher;
mod models;
mod outputs;
mod utils;

use cli::Cli;
use fetcher::HttpFetcher;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("gold_price_scraper starting up");

    let args = Cli::parse();
    debug!(output = %args.output.display(), timeout_secs = args.timeout_secs, format = ?args.format, "Parsed CLI arguments");

    let fetcher = HttpFetcher::new(args.timeout())?;
    let result = collector::run(&fetcher, args.format, &args.output).await;

    let elapsed = start_time.elapsed();
    info!(
        found = result.prices.found_count(),
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
