//! Command-line interface definitions for the gold price scraper.
//!
//! Every option has a default, so a bare invocation collects all sources
//! into `gold_price.json` in the working directory.

use crate::extract::PriceFormat;
use crate::fetcher::DEFAULT_TIMEOUT;
use crate::outputs::json::DEFAULT_OUTPUT_PATH;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Collect today's gold prices from Korean gold exchanges into a JSON file.
///
/// # Examples
///
/// ```sh
/// # Defaults: ./gold_price.json, 15 second timeout, prices like "450,000원"
/// gold_price_scraper
///
/// # Keep the page text as shown, write elsewhere
/// gold_price_scraper -o site/data/gold_price.json --format raw
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output JSON file, replaced on every run
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Per-request timeout in seconds
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..=60)
    )]
    pub timeout_secs: u64,

    /// How extracted prices are written
    #[arg(short, long, value_enum, default_value_t = PriceFormat::Won)]
    pub format: PriceFormat,
}

impl Cli {
    /// Per-request timeout handed to the HTTP client.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
