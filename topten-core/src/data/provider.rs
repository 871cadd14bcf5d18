//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over market-data sources (Naver
//! Finance, the Parquet store, synthetic data) so implementations can be
//! swapped, chained, and mocked for tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single daily close from a provider. Closes are positive; missing dates
/// (pre-listing, trading halt) are simply absent from the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosePrice {
    pub date: NaiveDate,
    pub close: f64,
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("ticker not found: {ticker}")]
    TickerNotFound { ticker: String },

    #[error("all providers in the chain failed for '{ticker}'")]
    ChainExhausted { ticker: String },

    #[error("store error: {0}")]
    StoreError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("no cached data for ticker '{ticker}' — run `download {ticker}` first")]
    NoCachedData { ticker: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for daily-close providers.
///
/// `fetch_closes` is idempotent and read-only. An empty Vec is a valid
/// result (no data over the window), distinct from a transport error.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily closes for a ticker over a date range, ordered by date.
    fn fetch_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClosePrice>, DataError>;

    /// Whether the provider is currently usable (not rate-limited or offline).
    fn is_available(&self) -> bool {
        true
    }
}

/// Progress callback for multi-ticker operations.
pub trait FetchProgress: Send {
    /// Called when starting to fetch a ticker.
    fn on_start(&self, ticker: &str, index: usize, total: usize);

    /// Called when a ticker fetch completes.
    fn on_complete(&self, ticker: &str, index: usize, total: usize, result: &Result<(), DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, ticker: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {ticker}...", index + 1, total);
    }

    fn on_complete(
        &self,
        ticker: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => println!("  OK: {ticker}"),
            Err(e) => println!("  FAIL: {ticker}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nDownload complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Validate and normalize a close series: sorted, deduplicated, positive.
///
/// Rows with non-positive or non-finite closes are dropped rather than
/// rejected — a halted day prices as absent, not as zero.
pub fn normalize_closes(mut closes: Vec<ClosePrice>) -> Vec<ClosePrice> {
    closes.retain(|c| c.close.is_finite() && c.close > 0.0);
    closes.sort_by_key(|c| c.date);
    closes.dedup_by_key(|c| c.date);
    closes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(date: &str, close: f64) -> ClosePrice {
        ClosePrice {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            close,
        }
    }

    #[test]
    fn normalize_sorts_dedups_and_drops_nonpositive() {
        let closes = vec![
            cp("2024-01-03", 101.0),
            cp("2024-01-02", 100.0),
            cp("2024-01-03", 999.0),
            cp("2024-01-04", 0.0),
            cp("2024-01-05", f64::NAN),
        ];
        let normalized = normalize_closes(closes);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0], cp("2024-01-02", 100.0));
        assert_eq!(normalized[1].close, 101.0);
    }
}
