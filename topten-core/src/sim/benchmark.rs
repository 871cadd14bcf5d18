//! Benchmark DCA replay.
//!
//! Replays the strategy's investment ledger against a single benchmark
//! instrument on the same date axis: each ledger entry is invested entirely
//! at that day's benchmark price, with fractional shares allowed. The
//! resulting curve is directly comparable to the strategy's snapshots.

use crate::domain::InvestmentLog;
use crate::price_cache::PriceCache;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One point on the benchmark curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPoint {
    pub date: NaiveDate,
    pub total_value: f64,
}

/// Replay the ledger as dollar-cost averaging into `benchmark`.
///
/// `dates` is the strategy's snapshot axis. While the benchmark has no
/// price yet (pre-listing), injected cash accrues and is invested at the
/// first nonzero price.
pub fn replay_dca(
    dates: &[NaiveDate],
    log: &InvestmentLog,
    cache: &PriceCache,
    benchmark: &str,
) -> Vec<BenchmarkPoint> {
    let mut entries: Vec<_> = log.entries().to_vec();
    entries.sort_by_key(|e| e.date);

    let mut cash = 0.0_f64;
    let mut qty = 0.0_f64;
    let mut entry_idx = 0;
    let mut curve = Vec::with_capacity(dates.len());

    for &date in dates {
        let price = {
            let exact = cache.price_on(benchmark, date);
            if exact > 0.0 {
                exact
            } else {
                cache.price_as_of(benchmark, date)
            }
        };

        while entry_idx < entries.len() && entries[entry_idx].date <= date {
            cash += entries[entry_idx].amount;
            entry_idx += 1;
        }
        if price > 0.0 && cash > 0.0 {
            qty += cash / price;
            cash = 0.0;
        }

        curve.push(BenchmarkPoint {
            date,
            total_value: qty * price + cash,
        });
    }

    curve
}
