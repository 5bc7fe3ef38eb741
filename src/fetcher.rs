//! Page fetching for the gold exchange front pages.
//!
//! Every source is fetched with a single GET request: no retries, one bounded
//! timeout, and headers that look like a desktop browser so the exchanges
//! serve their regular page instead of a bot check.
//!
//! # Architecture
//!
//! - [`FetchPage`]: Core trait that turns a URL into a decoded HTML body
//! - [`HttpFetcher`]: The `reqwest`-backed implementation used at runtime
//! - [`fetch_document`]: Boundary function that parses the body into a
//!   document and converts every failure into `None`
//!
//! # Character encoding
//!
//! Several of the exchanges serve EUC-KR pages with a missing or wrong
//! `charset`, so the declared charset is only logged. The body is decoded by
//! BOM, then strict UTF-8, then a content-based guess from `chardetng`.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use scraper::Html;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::utils::truncate_for_log;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a page could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request timed out")]
    Timeout,

    /// DNS, connect, TLS or other transport failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a 4xx or 5xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Trait for fetching a page body.
///
/// Implementors return the body already decoded to UTF-8. Tests swap the
/// network out by implementing this over in-memory HTML fixtures.
pub trait FetchPage {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`FetchPage`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = client_builder(timeout).build()?;
        Ok(Self { client })
    }

    #[cfg(test)]
    fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn client_builder(timeout: Duration) -> ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(browser_headers())
        .timeout(timeout)
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

impl FetchPage for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        let t0 = Instant::now();

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let declared = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type)
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        let (body, encoding) = decode_body(&bytes);
        debug!(
            %status,
            bytes = bytes.len(),
            declared_charset = declared.as_deref().unwrap_or("none"),
            detected_charset = encoding.name(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

/// Decode a response body without trusting the declared charset.
///
/// A byte-order mark wins, then strict UTF-8, then a content-based guess
/// with a `.kr` hint. Returns the text and the encoding that was used.
pub fn decode_body(bytes: &[u8]) -> (String, &'static Encoding) {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        let (text, actual, _) = encoding.decode(bytes);
        return (text.into_owned(), actual);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_owned(), UTF_8);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(Some(&b"kr"[..]), true);
    let (text, actual, had_errors) = guessed.decode(bytes);
    if had_errors {
        debug!(encoding = actual.name(), "Body contained malformed sequences");
    }
    (text.into_owned(), actual)
}

/// Pull the `charset` parameter out of a `Content-Type` value.
fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

/// Fetch `url` and parse it into a document.
///
/// Returns `None` on any fetch failure, after logging which URL failed and why.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_document<F: FetchPage>(fetcher: &F, url: &str) -> Option<Html> {
    match fetcher.fetch(url).await {
        Ok(body) => {
            debug!(preview = %truncate_for_log(body.trim_start(), 200), "Parsing page");
            Some(Html::parse_document(&body))
        }
        Err(e) => {
            warn!(%url, error = %e, "Fetch failed");
            None
        }
    }
}
