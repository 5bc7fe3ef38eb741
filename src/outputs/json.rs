//! JSON output for the collected prices.
//!
//! The file is the only contract with downstream consumers:
//!
//! ```text
//! {
//!     "last_updated": "2025-05-06 09:30:00",
//!     "prices": {
//!         "korea": "450,000원",
//!         "standard": "452,000원",
//!         "jaeil": "추출 실패",
//!         "jongro": "접속 실패"
//!     }
//! }
//! ```
//!
//! Keys keep their declaration order, Hangul is written unescaped, and each
//! run fully replaces the previous file. The write is not atomic.

use crate::models::CollectionResult;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Default output file, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "gold_price.json";

/// Serialize a result with 4-space indentation.
pub fn to_pretty_json(result: &CollectionResult) -> Result<String, Box<dyn Error>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    result.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

/// Write a [`CollectionResult`] to `path`, replacing any previous content.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_result(result: &CollectionResult, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut json = to_pretty_json(result)?;
    json.push('\n');

    info!("Writing JSON");
    if let Err(e) = fs::write(path, json).await {
        error!(error = %e, "Failed to write JSON");
        return Err(e.into());
    }
    info!(found = result.prices.found_count(), "Wrote price file");

    Ok(())
}
