//! Collection run across every gold exchange.
//!
//! Sources are visited one at a time in [`Source::ALL`] order. Each source's
//! outcome is independent: a failed fetch or a missed selector only affects
//! that source's slot, which then holds a sentinel quote.

use chrono::NaiveDateTime;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::extract::{PriceFormat, extract_price};
use crate::fetcher::{FetchPage, fetch_document};
use crate::models::{CollectionResult, PriceQuote, Prices, Source};
use crate::outputs::json::{to_pretty_json, write_result};
use crate::utils::{format_timestamp, local_now};

/// One full run: collect, print the record, then overwrite `output`.
///
/// A failed write is reported on the console and in the log but does not
/// fail the run; the collected record is returned either way.
pub async fn run<F: FetchPage>(fetcher: &F, format: PriceFormat, output: &Path) -> CollectionResult {
    let started = local_now();
    println!("[{}] 금시세 데이터 수집 시작...", format_timestamp(started));

    let result = collect_prices(fetcher, format).await;

    println!("수집된 데이터:");
    match to_pretty_json(&result) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "Failed to render result"),
    }

    match write_result(&result, output).await {
        Ok(()) => println!("성공: {} 파일이 업데이트되었습니다.", output.display()),
        Err(e) => println!("파일 저장 중 에러 발생: {e}"),
    }

    result
}

/// Collect every source, stamped with the current local time.
pub async fn collect_prices<F: FetchPage>(fetcher: &F, format: PriceFormat) -> CollectionResult {
    collect_prices_at(fetcher, format, local_now()).await
}

/// Collect every source, stamped with `at`.
#[instrument(level = "info", skip(fetcher))]
pub async fn collect_prices_at<F: FetchPage>(
    fetcher: &F,
    format: PriceFormat,
    at: NaiveDateTime,
) -> CollectionResult {
    let t0 = Instant::now();

    // Fields are evaluated top to bottom, which keeps the fetch order
    // identical to `Source::ALL`.
    let prices = Prices {
        korea: collect_source(fetcher, Source::Korea, format).await,
        standard: collect_source(fetcher, Source::Standard, format).await,
        jaeil: collect_source(fetcher, Source::Jaeil, format).await,
        jongro: collect_source(fetcher, Source::Jongro, format).await,
    };

    info!(
        found = prices.found_count(),
        total = Source::ALL.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Collection complete"
    );

    CollectionResult {
        last_updated: format_timestamp(at),
        prices,
    }
}

/// Fetch and extract a single source.
async fn collect_source<F: FetchPage>(fetcher: &F, source: Source, format: PriceFormat) -> PriceQuote {
    let doc = fetch_document(fetcher, source.url()).await;
    let quote = extract_price(doc.as_ref(), &source.rule(), format);

    match &quote {
        PriceQuote::Price(price) => info!(%source, name = source.name(), %price, "Price collected"),
        failure => warn!(%source, name = source.name(), outcome = %failure, "No price collected"),
    }
    quote
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use crate::fetcher::testing::FixtureFetcher;
    use chrono::NaiveDate;

    const KOREA_HTML: &str = r#"<html><body><div class="price_box"><ul class="price_list">
        <li><span class="price"> 450,000 원 </span></li></ul></div></body></html>"#;
    const STANDARD_HTML: &str =
        r#"<html><body><ul class="today_price_list"><li class="buy_price">452,000원</li></ul></body></html>"#;
    const JAEIL_HTML: &str = r#"<html><body><table class="price_table">
        <tr><th>구분</th><th>살 때</th></tr><tr><td>순금</td><td>454,000원</td></tr>
        </table></body></html>"#;
    const JONGRO_HTML: &str =
        r#"<html><body><div class="main_price_box"><p class="price">456,000원</p></div></body></html>"#;
    const MAINTENANCE_HTML: &str = "<html><body><p>점검 중</p></body></html>";

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn all_sources() -> FixtureFetcher {
        FixtureFetcher::new()
            .page(Source::Korea.url(), KOREA_HTML)
            .page(Source::Standard.url(), STANDARD_HTML)
            .page(Source::Jaeil.url(), JAEIL_HTML)
            .page(Source::Jongro.url(), JONGRO_HTML)
    }

    fn price(s: &str) -> PriceQuote {
        PriceQuote::Price(s.to_string())
    }

    #[tokio::test]
    async fn test_collect_all_sources() {
        let result = collect_prices_at(&all_sources(), PriceFormat::Won, at()).await;

        assert_eq!(result.last_updated, "2025-05-06 09:30:00");
        assert_eq!(result.prices.korea, price("450,000원"));
        assert_eq!(result.prices.standard, price("452,000원"));
        assert_eq!(result.prices.jaeil, price("454,000원"));
        assert_eq!(result.prices.jongro, price("456,000원"));
        assert_eq!(result.prices.found_count(), 4);
    }

    #[tokio::test]
    async fn test_connection_failure_is_isolated() {
        let fetcher = all_sources().error(Source::Standard.url(), FetchError::Status(503));
        let result = collect_prices_at(&fetcher, PriceFormat::Won, at()).await;

        assert_eq!(result.prices.standard, PriceQuote::ConnectionFailed);
        assert_eq!(result.prices.korea, price("450,000원"));
        assert_eq!(result.prices.jaeil, price("454,000원"));
        assert_eq!(result.prices.jongro, price("456,000원"));
    }

    #[tokio::test]
    async fn test_timeout_and_extraction_failure_together() {
        let fetcher = all_sources()
            .error(Source::Korea.url(), FetchError::Timeout)
            .page(Source::Jongro.url(), MAINTENANCE_HTML);
        let result = collect_prices_at(&fetcher, PriceFormat::Won, at()).await;

        assert_eq!(result.prices.korea, PriceQuote::ConnectionFailed);
        assert_eq!(result.prices.jongro, PriceQuote::ExtractionFailed);
        assert_eq!(result.prices.standard, price("452,000원"));
        assert_eq!(result.prices.jaeil, price("454,000원"));
    }

    #[tokio::test]
    async fn test_sources_fetched_once_in_fixed_order() {
        let fetcher = all_sources();
        collect_prices_at(&fetcher, PriceFormat::Won, at()).await;

        let expected: Vec<String> = Source::ALL.iter().map(|s| s.url().to_string()).collect();
        assert_eq!(fetcher.requested(), expected);
    }

    #[tokio::test]
    async fn test_every_source_down() {
        let result = collect_prices_at(&FixtureFetcher::new(), PriceFormat::Won, at()).await;
        for source in Source::ALL {
            assert_eq!(result.prices.get(source), &PriceQuote::ConnectionFailed);
        }
    }

    #[tokio::test]
    async fn test_raw_format() {
        let result = collect_prices_at(&all_sources(), PriceFormat::Raw, at()).await;
        assert_eq!(result.prices.korea, price("450,000 원"));
        assert_eq!(result.prices.jongro, price("456,000원"));
    }

    #[tokio::test]
    async fn test_run_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gold_price.json");
        let fetcher = all_sources().page(Source::Standard.url(), MAINTENANCE_HTML);

        let result = run(&fetcher, PriceFormat::Won, &path).await;

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let stamp = written["last_updated"].as_str().unwrap();
        let pattern = regex::Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").unwrap();
        assert!(pattern.is_match(stamp), "bad timestamp {stamp:?}");
        assert_eq!(stamp, result.last_updated);
        assert_eq!(written["prices"]["korea"], "450,000원");
        assert_eq!(written["prices"]["standard"], "추출 실패");
        assert_eq!(written["prices"]["jaeil"], "454,000원");
        assert_eq!(written["prices"]["jongro"], "456,000원");
    }

    #[tokio::test]
    async fn test_run_is_idempotent_except_timestamp() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gold_price.json");
        let fetcher = all_sources().page(Source::Jaeil.url(), MAINTENANCE_HTML);

        let read_without_timestamp = |path: &Path| {
            let mut value: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
            value.as_object_mut().unwrap().remove("last_updated");
            value
        };

        run(&fetcher, PriceFormat::Won, &path).await;
        let first = read_without_timestamp(&path);
        run(&fetcher, PriceFormat::Won, &path).await;
        let second = read_without_timestamp(&path);

        assert_eq!(first, second);
        assert_eq!(second["prices"]["jaeil"], "추출 실패");
    }

    #[tokio::test]
    async fn test_run_survives_write_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("gold_price.json");

        let result = run(&all_sources(), PriceFormat::Won, &path).await;

        assert_eq!(result.prices.found_count(), 4);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_collect_prices_stamps_now() {
        let result = collect_prices(&all_sources(), PriceFormat::Won).await;
        assert!(NaiveDateTime::parse_from_str(&result.last_updated, crate::utils::TIMESTAMP_FORMAT).is_ok());
    }
}
