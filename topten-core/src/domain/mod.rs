//! Domain types for the rebalancing backtester.

pub mod constituents;
pub mod ledger;
pub mod portfolio;
pub mod snapshot;

pub use constituents::{Constituent, ConstituentError, ConstituentTable, MissingYearPolicy};
pub use ledger::{InvestmentLog, InvestmentLogEntry};
pub use portfolio::PortfolioState;
pub use snapshot::DailySnapshot;

/// Ticker type alias (six-digit KRX codes, e.g. "005930").
pub type Ticker = String;
