//! Backtest runner — wires together calendar, cache, simulator, benchmark,
//! and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: builds the constituent table from the built-in KRX
//!   history. Used by the CLI.
//! - `run_backtest_with_table()`: takes an explicit table. Used by tests
//!   and callers with their own universe.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use topten_core::calendar::{CalendarError, TradingCalendar};
use topten_core::data::provider::{FetchProgress, PriceProvider};
use topten_core::domain::{ConstituentError, ConstituentTable};
use topten_core::fingerprint::fingerprint_run;
use topten_core::price_cache::PriceCache;
use topten_core::sim::{replay_dca, BenchmarkPoint, SimError, SimResult, Simulator};

use crate::config::{BacktestConfig, ConfigError};
use crate::krx;
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),
    #[error("constituent table error: {0}")]
    Constituent(#[from] ConstituentError),
    #[error("simulation error: {0}")]
    Sim(#[from] SimError),
    #[error("fingerprint serialization error: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRun {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config: BacktestConfig,
    pub result: SimResult,
    /// Benchmark DCA curve on the same date axis as the snapshots.
    pub benchmark: Vec<BenchmarkPoint>,
    pub metrics: PerformanceMetrics,
    pub fingerprint: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a backtest against the built-in KRX top-10 history.
pub fn run_backtest(
    config: &BacktestConfig,
    provider: Arc<dyn PriceProvider>,
    today: NaiveDate,
    progress: &dyn FetchProgress,
) -> Result<BacktestRun, RunError> {
    let table = krx::take_top_n(&krx::historical_top10()?, config.top_n)?;
    run_backtest_with_table(config, &table, provider, today, progress)
}

/// Run a backtest with an explicit constituent table.
pub fn run_backtest_with_table(
    config: &BacktestConfig,
    table: &ConstituentTable,
    provider: Arc<dyn PriceProvider>,
    today: NaiveDate,
    progress: &dyn FetchProgress,
) -> Result<BacktestRun, RunError> {
    config.validate()?;
    let (start, end) = config.window(today);

    // The calendar bootstrap is the only fatal data path: the reference
    // ticker's close series defines which days exist at all.
    progress.on_start(&config.reference_ticker, 0, 2);
    let calendar = TradingCalendar::fetch(provider.as_ref(), &config.reference_ticker, start, end)?;
    progress.on_complete(&config.reference_ticker, 0, 2, &Ok(()));

    let mut cache = PriceCache::new(provider);
    let result = Simulator::new(config.to_sim_config(), &calendar, &mut cache, table).run()?;

    // Benchmark replay shares the ledger and the snapshot date axis.
    progress.on_start(&config.benchmark_ticker, 1, 2);
    cache.ensure_cached(
        std::slice::from_ref(&config.benchmark_ticker),
        calendar.first(),
        calendar.last(),
    );
    progress.on_complete(&config.benchmark_ticker, 1, 2, &Ok(()));
    let dates: Vec<NaiveDate> = result.snapshots.iter().map(|s| s.date).collect();
    let benchmark = replay_dca(
        &dates,
        &result.investment_log,
        &cache,
        &config.benchmark_ticker,
    );

    // The replayed curve carries ledger cash even when the benchmark was
    // never priced, so the gate must look at the cached series, not the
    // curve values: an empty series means no benchmark comparison at all.
    let benchmark_priced = cache.series_len(&config.benchmark_ticker) > 0;
    let metrics = PerformanceMetrics::compute(
        &result.snapshots,
        &result.investment_log,
        benchmark_priced.then_some(benchmark.as_slice()),
    );

    let fingerprint = fingerprint_run(config, &result.snapshots)?.to_string();

    Ok(BacktestRun {
        schema_version: SCHEMA_VERSION,
        config: config.clone(),
        result,
        benchmark,
        metrics,
        fingerprint,
    })
}
