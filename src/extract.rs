//! Price extraction from a fetched exchange page.
//!
//! Every source goes through the same routine and only the
//! [`ExtractionRule`] differs:
//!
//! 1. No document → [`PriceQuote::ConnectionFailed`]
//! 2. Primary selector, then the fallback selector if the primary found nothing
//! 3. The node text is sanitized into a canonical price string
//! 4. Anything that does not yield a digit → [`PriceQuote::ExtractionFailed`]
//!
//! A selector miss is routine (the exchanges redesign without notice), so it is
//! logged at `debug` and never treated as an error.

use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ExtractionRule, PriceQuote};
use crate::utils::truncate_for_log;

/// Unit appended to prices in [`PriceFormat::Won`].
pub const CURRENCY_SUFFIX: &str = "원";

static NON_PRICE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9,]").expect("static regex is valid"));

/// How matched text is turned into the output string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PriceFormat {
    /// Digits and thousands separators followed by `원`, e.g. `450,000원`.
    #[default]
    Won,
    /// The node text as shown on the page, whitespace collapsed.
    Raw,
}

/// Result of running a rule's selectors against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Text of the first matching node.
    Found(String),
    NotFound,
}

/// A selector in an [`ExtractionRule`] that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector `{selector}`: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// Extract a price quote from `doc` using `rule`.
///
/// `None` means the page was never fetched. This never panics and never
/// returns an empty string: every failure maps to a sentinel quote.
pub fn extract_price(doc: Option<&Html>, rule: &ExtractionRule, format: PriceFormat) -> PriceQuote {
    let Some(doc) = doc else {
        return PriceQuote::ConnectionFailed;
    };

    match lookup(doc, rule) {
        Ok(Lookup::Found(text)) => match sanitize(&text, format) {
            Some(price) => PriceQuote::Price(price),
            None => {
                debug!(text = %truncate_for_log(text.trim(), 80), "Price node held no digits");
                PriceQuote::ExtractionFailed
            }
        },
        Ok(Lookup::NotFound) => {
            debug!(primary = rule.primary, fallback = ?rule.fallback, "No price selector matched");
            PriceQuote::ExtractionFailed
        }
        Err(e) => {
            warn!(error = %e, "Unusable price selector");
            PriceQuote::ExtractionFailed
        }
    }
}

/// Try the primary selector, then the fallback.
pub fn lookup(doc: &Html, rule: &ExtractionRule) -> Result<Lookup, SelectorError> {
    if let Lookup::Found(text) = select_text(doc, rule.primary)? {
        return Ok(Lookup::Found(text));
    }
    match rule.fallback {
        Some(fallback) => select_text(doc, fallback),
        None => Ok(Lookup::NotFound),
    }
}

/// Text of the first node matching `selector`; a blank node counts as a miss.
fn select_text(doc: &Html, selector: &str) -> Result<Lookup, SelectorError> {
    let parsed = Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        message: e.to_string(),
    })?;

    let Some(node) = doc.select(&parsed).next() else {
        return Ok(Lookup::NotFound);
    };
    let text = node.text().collect::<String>();
    if text.trim().is_empty() {
        return Ok(Lookup::NotFound);
    }
    debug!(selector, "Selector matched");
    Ok(Lookup::Found(text))
}

/// Normalize matched text into a price string.
///
/// Returns `None` if and only if `text` contains no ASCII digit.
pub fn sanitize(text: &str, format: PriceFormat) -> Option<String> {
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    match format {
        PriceFormat::Won => {
            let kept = NON_PRICE_CHARS.replace_all(text, "");
            Some(format!("{}{CURRENCY_SUFFIX}", kept.trim_matches(',')))
        }
        PriceFormat::Raw => Some(text.split_whitespace().collect::<Vec<_>>().join(" ")),
    }
}
