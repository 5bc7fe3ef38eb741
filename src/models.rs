//! Data models for gold price sources and collected quotes.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Source`]: The fixed set of gold exchanges that are scraped
//! - [`ExtractionRule`]: Where on a source's page the price lives
//! - [`PriceQuote`]: One source's price, or the reason there is none
//! - [`Prices`] / [`CollectionResult`]: The record written to `gold_price.json`

use serde::{Serialize, Serializer};
use std::fmt;

/// Sentinel written when the source page could not be fetched.
pub const CONNECTION_FAILED: &str = "접속 실패";

/// Sentinel written when the page was fetched but no price could be read from it.
pub const EXTRACTION_FAILED: &str = "추출 실패";

/// A gold exchange whose front page carries a price quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// 한국금거래소
    Korea,
    /// 한국표준금거래소
    Standard,
    /// 제일금거래소
    Jaeil,
    /// 종로금거래소
    Jongro,
}

impl Source {
    /// Every source, in the order they are collected and serialized.
    pub const ALL: [Source; 4] = [Source::Korea, Source::Standard, Source::Jaeil, Source::Jongro];

    /// The key used for this source in the output JSON.
    pub fn key(self) -> &'static str {
        match self {
            Source::Korea => "korea",
            Source::Standard => "standard",
            Source::Jaeil => "jaeil",
            Source::Jongro => "jongro",
        }
    }

    /// Human-readable exchange name.
    pub fn name(self) -> &'static str {
        match self {
            Source::Korea => "한국금거래소",
            Source::Standard => "한국표준금거래소",
            Source::Jaeil => "제일금거래소",
            Source::Jongro => "종로금거래소",
        }
    }

    /// Front page carrying the price quote.
    ///
    /// # Returns
    ///
    /// An absolute `http` or `https` URL; two of the exchanges have no TLS.
    pub fn url(self) -> &'static str {
        match self {
            Source::Korea => "https://www.koreagoldx.co.kr/",
            Source::Standard => "https://www.goldbars.co.kr/",
            Source::Jaeil => "http://goldcafe.co.kr/",
            Source::Jongro => "http://www.jongrogold.com/",
        }
    }

    /// Selectors locating the price node on this source's page.
    ///
    /// The fallback covers an older layout of the same site and is only
    /// consulted when the primary selector matches nothing.
    pub fn rule(self) -> ExtractionRule {
        match self {
            Source::Korea => ExtractionRule {
                primary: ".price_box .price_list li:first-child .price",
                fallback: Some(".price_list .price"),
            },
            Source::Standard => ExtractionRule {
                primary: ".today_price_list .buy_price",
                fallback: Some(".buy_price"),
            },
            Source::Jaeil => ExtractionRule {
                primary: ".price_table tr:nth-child(2) td:nth-child(2)",
                fallback: Some("table tr:nth-child(2) td:nth-child(2)"),
            },
            Source::Jongro => ExtractionRule {
                primary: ".main_price_box .price",
                fallback: Some(".price"),
            },
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// CSS selectors for one source's price node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionRule {
    /// Selector for the current page layout.
    pub primary: &'static str,
    /// Selector for an alternate known layout.
    pub fallback: Option<&'static str>,
}

/// The outcome of collecting one source.
///
/// Serializes to a plain JSON string: the price itself, or one of the
/// sentinel strings [`CONNECTION_FAILED`] / [`EXTRACTION_FAILED`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceQuote {
    /// A canonical price string, e.g. `"450,000원"`.
    Price(String),
    /// The page could not be fetched.
    ConnectionFailed,
    /// The page was fetched but held no readable price.
    ExtractionFailed,
}

impl PriceQuote {
    /// The string written to the output file for this quote.
    ///
    /// # Returns
    ///
    /// The price itself, or [`CONNECTION_FAILED`] / [`EXTRACTION_FAILED`].
    pub fn as_str(&self) -> &str {
        match self {
            PriceQuote::Price(price) => price,
            PriceQuote::ConnectionFailed => CONNECTION_FAILED,
            PriceQuote::ExtractionFailed => EXTRACTION_FAILED,
        }
    }

    /// `true` for an actual price, `false` for either sentinel.
    pub fn is_price(&self) -> bool {
        matches!(self, PriceQuote::Price(_))
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PriceQuote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One quote per source.
///
/// Field order matches [`Source::ALL`] so the serialized key order is stable.
/// There is no `Default`: every field has to come from an actual collection
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prices {
    pub korea: PriceQuote,
    pub standard: PriceQuote,
    pub jaeil: PriceQuote,
    pub jongro: PriceQuote,
}

impl Prices {
    /// Look up the quote collected for `source`.
    ///
    /// # Arguments
    ///
    /// * `source` - Which exchange to read
    ///
    /// # Returns
    ///
    /// The quote in that source's slot. Every slot is always filled.
    pub fn get(&self, source: Source) -> &PriceQuote {
        match source {
            Source::Korea => &self.korea,
            Source::Standard => &self.standard,
            Source::Jaeil => &self.jaeil,
            Source::Jongro => &self.jongro,
        }
    }

    /// Number of sources that yielded an actual price.
    pub fn found_count(&self) -> usize {
        Source::ALL
            .iter()
            .filter(|source| self.get(**source).is_price())
            .count()
    }
}

/// The record produced by a single collection run.
///
/// Built fresh on every run and immediately written out; nothing is ever
/// read back from a previous file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionResult {
    /// Local wall-clock time of the run, `YYYY-MM-DD HH:MM:SS`.
    pub last_updated: String,
    pub prices: Prices,
}
