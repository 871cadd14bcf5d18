//! TopTen Core — engine for the Top-N equal-weight rebalancing backtest.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (portfolio state, snapshots, investment ledger, constituent table)
//! - Trading calendar with ordinal-weekday schedule resolution
//! - In-memory price cache with exact and forward-filled lookups
//! - The rebalancing portfolio simulator (a sequential fold over trading days)
//! - Benchmark dollar-cost-averaging replay
//! - Data provider layer: trait, ranked fallback chain, Naver Finance,
//!   synthetic data, and the on-disk Parquet store

pub mod calendar;
pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod price_cache;
pub mod sim;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types that cross the rayon prefetch boundary and
    /// the runner/CLI seam are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::DailySnapshot>();
        require_sync::<domain::DailySnapshot>();
        require_send::<domain::InvestmentLog>();
        require_sync::<domain::InvestmentLog>();
        require_send::<domain::PortfolioState>();
        require_sync::<domain::PortfolioState>();
        require_send::<domain::ConstituentTable>();
        require_sync::<domain::ConstituentTable>();

        require_send::<calendar::TradingCalendar>();
        require_sync::<calendar::TradingCalendar>();

        require_send::<price_cache::PriceCache>();
        require_sync::<price_cache::PriceCache>();

        require_send::<sim::SimConfig>();
        require_sync::<sim::SimConfig>();
        require_send::<sim::SimResult>();
        require_sync::<sim::SimResult>();

        require_send::<data::NaverProvider>();
        require_sync::<data::NaverProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
        require_send::<data::ProviderChain>();
        require_sync::<data::ProviderChain>();
    }
}
