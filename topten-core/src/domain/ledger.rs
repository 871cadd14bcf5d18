//! InvestmentLog — append-only ledger of every cash injection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single cash injection: the initial capital or a monthly contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestmentLogEntry {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Append-only ledger of cash injections.
///
/// Entries are recorded in simulation order and never removed. The sum of
/// entries at or before a date is the total capital ever injected by that
/// date; the benchmark replay consumes this ledger verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestmentLog {
    entries: Vec<InvestmentLogEntry>,
}

impl InvestmentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, date: NaiveDate, amount: f64) {
        self.entries.push(InvestmentLogEntry { date, amount });
    }

    pub fn entries(&self) -> &[InvestmentLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total capital ever injected.
    pub fn total_invested(&self) -> f64 {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Total capital injected at or before `date`.
    pub fn invested_through(&self, date: NaiveDate) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.date <= date)
            .map(|e| e.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn totals_accumulate() {
        let mut log = InvestmentLog::new();
        log.record(d(2024, 1, 8), 1_000_000.0);
        log.record(d(2024, 2, 12), 1_000_000.0);
        log.record(d(2024, 3, 11), 1_000_000.0);

        assert_eq!(log.len(), 3);
        assert_eq!(log.total_invested(), 3_000_000.0);
        assert_eq!(log.invested_through(d(2024, 2, 12)), 2_000_000.0);
        assert_eq!(log.invested_through(d(2024, 1, 1)), 0.0);
    }
}
