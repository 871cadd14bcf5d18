//! TopTen Runner — backtest orchestration, metrics, reporting, export.
//!
//! This crate builds on `topten-core` to provide:
//! - TOML backtest configuration with validation and defaults
//! - The curated KRX top-10 constituent history (2016–2026)
//! - Performance metrics computed against invested capital
//! - Markdown reports and CSV/JSON artifact export
//! - The single-run orchestrator wiring calendar, cache, simulator,
//!   benchmark replay, and fingerprinting together

pub mod config;
pub mod export;
pub mod krx;
pub mod metrics;
pub mod report;
pub mod runner;

pub use config::{BacktestConfig, ConfigError};
pub use export::{export_json, import_json, load_artifacts, save_artifacts};
pub use krx::historical_top10;
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, run_backtest_with_table, BacktestRun, RunError, SCHEMA_VERSION};
