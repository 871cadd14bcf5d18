//! Download orchestrator — multi-ticker prefetch with progress reporting.

use super::provider::{DataError, FetchProgress, PriceProvider};
use super::store::{CoverageResult, PriceStore};
use chrono::NaiveDate;

/// Download close series for several tickers into the store.
///
/// Returns a summary of successes and failures. An already-covered ticker
/// counts as a success without touching the network unless `force` is set.
pub fn download_tickers(
    provider: &dyn PriceProvider,
    store: &PriceStore,
    tickers: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
    progress: &dyn FetchProgress,
) -> DownloadSummary {
    let total = tickers.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, ticker) in tickers.iter().enumerate() {
        progress.on_start(ticker, i, total);

        if !force {
            if let CoverageResult::FullyCovered = store.covers_range(ticker, start, end) {
                progress.on_complete(ticker, i, total, &Ok(()));
                succeeded += 1;
                continue;
            }
        }

        let result = download_single(provider, store, ticker, start, end);
        progress.on_complete(ticker, i, total, &result);

        match result {
            Ok(()) => succeeded += 1,
            Err(e) => {
                errors.push((ticker.to_string(), e));
                failed += 1;
            }
        }

        if !provider.is_available() {
            for t in &tickers[(i + 1)..total] {
                errors.push((
                    t.to_string(),
                    DataError::Other("provider became unavailable".into()),
                ));
                failed += 1;
            }
            break;
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

fn download_single(
    provider: &dyn PriceProvider,
    store: &PriceStore,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), DataError> {
    let closes = provider.fetch_closes(ticker, start, end)?;
    if closes.is_empty() {
        return Err(DataError::TickerNotFound {
            ticker: ticker.to_string(),
        });
    }
    store.write(ticker, provider.name(), &closes)?;
    Ok(())
}

/// Summary of a batch download operation.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
