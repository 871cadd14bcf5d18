//! Ranked provider fallback chain.
//!
//! Providers are tried in registration order; the first non-empty result
//! wins. A provider that errors or returns an empty series is skipped. This
//! is the one capability interface the rest of the system sees — callers
//! never know which concrete source answered.

use super::provider::{normalize_closes, ClosePrice, DataError, PriceProvider};
use chrono::NaiveDate;
use std::sync::Arc;

/// Ordered list of providers behind a single `PriceProvider` face.
pub struct ProviderChain {
    providers: Vec<Arc<dyn PriceProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn PriceProvider>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl PriceProvider for ProviderChain {
    fn name(&self) -> &str {
        "provider-chain"
    }

    fn fetch_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClosePrice>, DataError> {
        let mut last_err: Option<DataError> = None;

        for provider in &self.providers {
            if !provider.is_available() {
                continue;
            }
            match provider.fetch_closes(ticker, start, end) {
                Ok(closes) => {
                    let closes = normalize_closes(closes);
                    if !closes.is_empty() {
                        return Ok(closes);
                    }
                }
                Err(e) => last_err = Some(e),
            }
        }

        match last_err {
            Some(e) => Err(e),
            // Every provider answered, all empty: a valid empty series.
            None => Ok(Vec::new()),
        }
    }

    fn is_available(&self) -> bool {
        self.providers.iter().any(|p| p.is_available())
    }
}
