//! Serializable backtest configuration.
//!
//! The TOML file mirrors the strategy's knobs: capital, fee, schedule, the
//! run window, and the reference/benchmark tickers. Every field has a
//! default matching the original Korean top-10 strategy, so an empty file
//! is a valid configuration.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use topten_core::calendar::ClampPolicy;
use topten_core::domain::MissingYearPolicy;
use topten_core::sim::{Schedule, SimConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("top_n must be at least 1, got {0}")]
    InvalidTopN(usize),

    #[error("fee_rate must be in [0, 1), got {0}")]
    InvalidFeeRate(f64),

    #[error("weekday index must be 0..=6 (0 = Monday), got {0}")]
    InvalidWeekday(u8),

    #[error("ordinal week must be 1..=5, got {0}")]
    InvalidOrdinal(u32),

    #[error("month must be 1..=12, got {0}")]
    InvalidMonth(u32),

    #[error("start date {start} is not before end date {end}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },
}

/// Backtest configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestConfig {
    /// Number of constituents held (the "N" in top-N).
    pub top_n: usize,
    /// Lump sum invested at the first rebalance, KRW.
    pub initial_capital: f64,
    /// Cash added on each contribution date, KRW.
    pub monthly_contribution: f64,
    /// Proportional fee on liquidation proceeds.
    pub fee_rate: f64,

    /// Month of the annual rebalance (1 = January).
    pub rebalance_month: u32,
    /// Which occurrence of the rebalance weekday (2 = second).
    pub rebalance_week: u32,
    /// Rebalance weekday index, 0 = Monday.
    pub rebalance_weekday: u8,
    /// Which occurrence of the contribution weekday.
    pub contribution_week: u32,
    /// Contribution weekday index, 0 = Monday.
    pub contribution_weekday: u8,

    /// Explicit run window start; when absent, derived from
    /// `start_year_offset` against the end of the window.
    pub start_date: Option<NaiveDate>,
    /// Explicit run window end; when absent, today.
    pub end_date: Option<NaiveDate>,
    /// Years of history when `start_date` is absent.
    pub start_year_offset: u32,

    /// Ticker whose close series defines the trading calendar.
    pub reference_ticker: String,
    /// Benchmark instrument for the DCA comparison (KODEX 200 ETF).
    pub benchmark_ticker: String,

    pub clamp: ClampPolicy,
    pub missing_year: MissingYearPolicy,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            initial_capital: 1_000_000.0,
            monthly_contribution: 1_000_000.0,
            fee_rate: 0.002,
            rebalance_month: 1,
            rebalance_week: 2,
            rebalance_weekday: 0,
            contribution_week: 2,
            contribution_weekday: 0,
            start_date: None,
            end_date: None,
            start_year_offset: 10,
            reference_ticker: "005930".to_string(),
            benchmark_ticker: "069500".to_string(),
            clamp: ClampPolicy::ClampToLast,
            missing_year: MissingYearPolicy::NearestYear,
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::InvalidTopN(self.top_n));
        }
        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(ConfigError::InvalidFeeRate(self.fee_rate));
        }
        for weekday in [self.rebalance_weekday, self.contribution_weekday] {
            if weekday > 6 {
                return Err(ConfigError::InvalidWeekday(weekday));
            }
        }
        for week in [self.rebalance_week, self.contribution_week] {
            if !(1..=5).contains(&week) {
                return Err(ConfigError::InvalidOrdinal(week));
            }
        }
        if !(1..=12).contains(&self.rebalance_month) {
            return Err(ConfigError::InvalidMonth(self.rebalance_month));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start >= end {
                return Err(ConfigError::EmptyWindow { start, end });
            }
        }
        Ok(())
    }

    /// Resolve the run window against `today`.
    ///
    /// Missing end defaults to today; missing start defaults to
    /// `start_year_offset` years before the end (clamped to Feb 28 when
    /// the end lands on a leap day).
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let end = self.end_date.unwrap_or(today);
        let start = self.start_date.unwrap_or_else(|| {
            let year = end.year() - self.start_year_offset as i32;
            NaiveDate::from_ymd_opt(year, end.month(), end.day()).unwrap_or_else(|| {
                NaiveDate::from_ymd_opt(year, end.month(), 28)
                    .unwrap_or(NaiveDate::MIN)
            })
        });
        (start, end)
    }

    /// Translate into the simulator's config.
    pub fn to_sim_config(&self) -> SimConfig {
        SimConfig {
            initial_capital: self.initial_capital,
            monthly_contribution: self.monthly_contribution,
            fee_rate: self.fee_rate,
            schedule: Schedule {
                rebalance_month: self.rebalance_month,
                rebalance_ordinal: self.rebalance_week,
                rebalance_weekday: weekday_from_index(self.rebalance_weekday),
                contribution_ordinal: self.contribution_week,
                contribution_weekday: weekday_from_index(self.contribution_weekday),
            },
            clamp: self.clamp,
            missing_year: self.missing_year,
        }
    }
}

/// Weekday from the 0 = Monday index used in the config file.
///
/// The index is validated to 0..=6 before this is called; out-of-range
/// values were rejected by `validate`, so the fallback arm is unreachable
/// for loaded configs.
pub fn weekday_from_index(index: u8) -> Weekday {
    match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}
