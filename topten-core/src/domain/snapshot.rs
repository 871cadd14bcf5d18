//! DailySnapshot — one valuation record per simulated trading day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// End-of-day valuation of the strategy portfolio.
///
/// Appended once per trading day, never mutated. The ordered snapshot
/// sequence is the backtest's primary output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub total_value: f64,
    pub cash: f64,
    pub holdings_value: f64,
}

impl DailySnapshot {
    /// The valuation identity: `total_value == cash + holdings_value`.
    ///
    /// Holds exactly at construction; exposed for invariant tests.
    pub fn is_consistent(&self) -> bool {
        (self.total_value - (self.cash + self.holdings_value)).abs() < 1e-6
    }
}
