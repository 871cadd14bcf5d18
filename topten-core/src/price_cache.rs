//! PriceCache — the lazily-populated in-memory close-series cache.
//!
//! Owns the full historical close series per ticker for the backtest
//! window, populated once per ticker and never invalidated within a run.
//! Lookup semantics split by purpose: `price_on` for trade-time exactness,
//! `price_as_of` for continuous mark-to-market valuation.

use crate::data::provider::{normalize_closes, PriceProvider};
use crate::domain::Ticker;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// In-memory close-series cache in front of a price provider.
pub struct PriceCache {
    provider: Arc<dyn PriceProvider>,
    series: HashMap<Ticker, BTreeMap<NaiveDate, f64>>,
}

impl PriceCache {
    pub fn new(provider: Arc<dyn PriceProvider>) -> Self {
        Self {
            provider,
            series: HashMap::new(),
        }
    }

    /// Populate the cache for every ticker not yet present.
    ///
    /// Fetches run in parallel — population order is irrelevant and each
    /// ticker is independent. A per-ticker fetch failure stores an empty
    /// series instead of failing the batch: that ticker simply prices at 0
    /// for the rest of the run.
    pub fn ensure_cached(&mut self, tickers: &[Ticker], start: NaiveDate, end: NaiveDate) {
        let missing: Vec<Ticker> = tickers
            .iter()
            .filter(|t| !self.series.contains_key(*t))
            .cloned()
            .collect();

        let provider = Arc::clone(&self.provider);
        let fetched: Vec<(Ticker, BTreeMap<NaiveDate, f64>)> = missing
            .into_par_iter()
            .map(|ticker| {
                let closes = provider
                    .fetch_closes(&ticker, start, end)
                    .map(normalize_closes)
                    .unwrap_or_default();
                let map = closes.into_iter().map(|c| (c.date, c.close)).collect();
                (ticker, map)
            })
            .collect();

        for (ticker, map) in fetched {
            self.series.insert(ticker, map);
        }
    }

    /// Exact-date close, or 0.0 when the date is absent or the ticker is
    /// uncached. Zero means "unpriceable today": callers skip the trade,
    /// they never book a zero-priced one.
    pub fn price_on(&self, ticker: &str, date: NaiveDate) -> f64 {
        self.series
            .get(ticker)
            .and_then(|s| s.get(&date))
            .copied()
            .unwrap_or(0.0)
    }

    /// Latest close at or before `date` (forward-fill), or 0.0 when no
    /// earlier close exists. Used for daily revaluation so a stale ticker
    /// keeps contributing its last known value.
    pub fn price_as_of(&self, ticker: &str, date: NaiveDate) -> f64 {
        self.series
            .get(ticker)
            .and_then(|s| s.range(..=date).next_back())
            .map(|(_, close)| *close)
            .unwrap_or(0.0)
    }

    /// Single-day direct re-fetch, the trade-time fallback when the cached
    /// exact price is 0. A successful result is written back into the
    /// series; failure degrades to 0.0 as usual.
    pub fn refetch_on(&mut self, ticker: &str, date: NaiveDate) -> f64 {
        let fetched = self
            .provider
            .fetch_closes(ticker, date, date)
            .map(normalize_closes)
            .unwrap_or_default();

        match fetched.iter().find(|c| c.date == date) {
            Some(c) => {
                self.series
                    .entry(ticker.to_string())
                    .or_default()
                    .insert(c.date, c.close);
                c.close
            }
            None => 0.0,
        }
    }

    /// Whether a ticker has been populated (possibly with an empty series).
    pub fn is_cached(&self, ticker: &str) -> bool {
        self.series.contains_key(ticker)
    }

    /// Number of cached closes for a ticker.
    pub fn series_len(&self, ticker: &str) -> usize {
        self.series.get(ticker).map_or(0, |s| s.len())
    }
}
