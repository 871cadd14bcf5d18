//! End-to-end runner tests over synthetic data.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use topten_core::data::provider::{ClosePrice, DataError, FetchProgress, PriceProvider};
use topten_core::data::SyntheticProvider;
use topten_core::domain::{Constituent, ConstituentTable};
use topten_runner::config::BacktestConfig;
use topten_runner::{export, run_backtest, run_backtest_with_table};

struct SilentProgress;
impl FetchProgress for SilentProgress {
    fn on_start(&self, _: &str, _: usize, _: usize) {}
    fn on_complete(&self, _: &str, _: usize, _: usize, _: &Result<(), DataError>) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Prices everything except one ticker, which always fails to fetch.
struct HoleProvider {
    inner: SyntheticProvider,
    missing: String,
}

impl PriceProvider for HoleProvider {
    fn name(&self) -> &str {
        "hole"
    }

    fn fetch_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClosePrice>, DataError> {
        if ticker == self.missing {
            return Err(DataError::TickerNotFound {
                ticker: ticker.to_string(),
            });
        }
        self.inner.fetch_closes(ticker, start, end)
    }
}

fn synthetic_config() -> BacktestConfig {
    BacktestConfig {
        start_date: Some(d(2020, 1, 1)),
        end_date: Some(d(2022, 12, 31)),
        ..BacktestConfig::default()
    }
}

fn small_table() -> ConstituentTable {
    ConstituentTable::new(BTreeMap::from([
        (
            2020,
            vec![
                Constituent::new("005930", "Samsung Electronics"),
                Constituent::new("000660", "SK Hynix"),
                Constituent::new("035420", "NAVER"),
            ],
        ),
        (
            2021,
            vec![
                Constituent::new("005930", "Samsung Electronics"),
                Constituent::new("000660", "SK Hynix"),
                Constituent::new("051910", "LG Chem"),
            ],
        ),
        (
            2022,
            vec![
                Constituent::new("005930", "Samsung Electronics"),
                Constituent::new("373220", "LG Energy Solution"),
                Constituent::new("000660", "SK Hynix"),
            ],
        ),
    ]))
    .unwrap()
}

#[test]
fn full_run_over_synthetic_data() {
    let provider = Arc::new(SyntheticProvider::new(42));
    let run = run_backtest_with_table(
        &synthetic_config(),
        &small_table(),
        provider,
        d(2026, 1, 1),
        &SilentProgress,
    )
    .unwrap();

    assert!(!run.result.snapshots.is_empty());
    assert!(run.result.snapshots.iter().all(|s| s.is_consistent()));
    assert_eq!(run.benchmark.len(), run.result.snapshots.len());

    // Three rebalance years selected.
    assert_eq!(run.result.selections.len(), 3);

    // Invested capital: initial + one contribution per non-initial entry.
    let expected = 1_000_000.0 + (run.result.investment_log.len() as f64 - 1.0) * 1_000_000.0;
    assert!((run.metrics.total_invested - expected).abs() < 1e-6);
    assert!(run.metrics.trading_days == run.result.snapshots.len());
    assert!(!run.fingerprint.is_empty());
}

#[test]
fn identical_configs_identical_fingerprints() {
    let run_once = || {
        run_backtest_with_table(
            &synthetic_config(),
            &small_table(),
            Arc::new(SyntheticProvider::new(42)),
            d(2026, 1, 1),
            &SilentProgress,
        )
        .unwrap()
    };
    let a = run_once();
    let b = run_once();
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(a.result.snapshots, b.result.snapshots);
}

#[test]
fn different_seed_changes_fingerprint() {
    let run_with_seed = |seed: u64| {
        run_backtest_with_table(
            &synthetic_config(),
            &small_table(),
            Arc::new(SyntheticProvider::new(seed)),
            d(2026, 1, 1),
            &SilentProgress,
        )
        .unwrap()
    };
    assert_ne!(run_with_seed(1).fingerprint, run_with_seed(2).fingerprint);
}

#[test]
fn unpriced_benchmark_omits_benchmark_metrics() {
    let config = synthetic_config();
    let provider = Arc::new(HoleProvider {
        inner: SyntheticProvider::new(42),
        missing: config.benchmark_ticker.clone(),
    });
    let run = run_backtest_with_table(
        &config,
        &small_table(),
        provider,
        d(2026, 1, 1),
        &SilentProgress,
    )
    .unwrap();

    // The replayed curve still exists (ledger cash accrues on it) but no
    // benchmark price was ever fetched, so no comparison is reported.
    assert_eq!(run.benchmark.len(), run.result.snapshots.len());
    assert_eq!(run.metrics.benchmark_final_value, None);
    assert_eq!(run.metrics.benchmark_return, None);
}

#[test]
fn builtin_history_runs_end_to_end() {
    let config = BacktestConfig {
        start_date: Some(d(2016, 1, 1)),
        end_date: Some(d(2025, 12, 31)),
        ..BacktestConfig::default()
    };
    let run = run_backtest(
        &config,
        Arc::new(SyntheticProvider::new(7)),
        d(2026, 1, 1),
        &SilentProgress,
    )
    .unwrap();

    // One rebalance per year across the decade, ten names each from the
    // built-in table.
    assert_eq!(run.result.selections.len(), 10);
    for year in 2016..=2025 {
        assert_eq!(run.result.selections[&year].len(), 10, "year {year}");
    }
    assert!(run.result.warnings.is_empty());
    assert!(run.result.snapshots.iter().all(|s| s.is_consistent()));

    let expected = 1_000_000.0 + (run.result.investment_log.len() as f64 - 1.0) * 1_000_000.0;
    assert!((run.metrics.total_invested - expected).abs() < 1e-6);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let run = run_backtest_with_table(
        &synthetic_config(),
        &small_table(),
        Arc::new(SyntheticProvider::new(42)),
        d(2026, 1, 1),
        &SilentProgress,
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let run_dir = export::save_artifacts(&run, dir.path()).unwrap();
    let back = export::load_artifacts(&run_dir).unwrap();

    assert_eq!(back.fingerprint, run.fingerprint);
    assert_eq!(back.result.snapshots.len(), run.result.snapshots.len());

    let report = std::fs::read_to_string(run_dir.join("report.md")).unwrap();
    assert!(report.contains("Performance Summary"));
    assert!(report.contains("Yearly Selections"));
}
