//! PortfolioState — cash plus the integer share book.

use super::Ticker;
use std::collections::BTreeMap;

/// Mutable portfolio state owned by the simulator, one instance per run.
///
/// The valuation identity must hold at every snapshot:
/// `total_value == cash + holdings_value`. Cash is kept non-negative by
/// construction: buys are floor-divided against the allocation before any
/// cash is deducted.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    pub cash: f64,
    /// Held quantity per ticker. Strategy positions are whole shares only;
    /// flat tickers are removed rather than stored at zero.
    pub positions: BTreeMap<Ticker, u64>,
}

impl PortfolioState {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            positions: BTreeMap::new(),
        }
    }

    /// Whether the book holds no shares at all.
    pub fn is_flat(&self) -> bool {
        self.positions.is_empty()
    }

    /// Market value of all held shares, priced through `price_of`.
    ///
    /// A ticker priced at 0 contributes nothing (unpriceable today).
    pub fn holdings_value(&self, mut price_of: impl FnMut(&str) -> f64) -> f64 {
        self.positions
            .iter()
            .map(|(ticker, qty)| *qty as f64 * price_of(ticker))
            .sum()
    }

    /// Cash plus holdings value.
    pub fn total_value(&self, price_of: impl FnMut(&str) -> f64) -> f64 {
        self.cash + self.holdings_value(price_of)
    }
}
