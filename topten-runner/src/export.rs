//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! Three export formats:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: daily value history and the investment log for external tools
//! - **Markdown**: the human-readable run report
//!
//! Persisted JSON includes a `schema_version` field. Unknown versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use topten_core::domain::{DailySnapshot, InvestmentLogEntry};

use crate::report;
use crate::runner::{BacktestRun, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestRun` to pretty JSON.
pub fn export_json(run: &BacktestRun) -> Result<String> {
    serde_json::to_string_pretty(run).context("failed to serialize BacktestRun to JSON")
}

/// Deserialize a `BacktestRun` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestRun> {
    let run: BacktestRun =
        serde_json::from_str(json).context("failed to deserialize BacktestRun from JSON")?;
    if run.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            run.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(run)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the daily value history as CSV.
///
/// Columns: date, total_value, cash, holdings_value
pub fn export_history_csv(snapshots: &[DailySnapshot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "total_value", "cash", "holdings_value"])?;
    for s in snapshots {
        wtr.write_record([
            &s.date.to_string(),
            &format!("{:.2}", s.total_value),
            &format!("{:.2}", s.cash),
            &format!("{:.2}", s.holdings_value),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the investment log as CSV with date and amount columns.
pub fn export_investments_csv(entries: &[InvestmentLogEntry]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "amount"])?;
    for entry in entries {
        wtr.write_record([&entry.date.to_string(), &format!("{:.2}", entry.amount)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run.
///
/// Creates a directory named `run_{timestamp}/` under `output_dir`
/// containing:
/// - `run.json` — the full `BacktestRun`
/// - `report.md` — the Markdown report
/// - `history.csv` — daily value curve
/// - `investments.csv` — the cash-injection ledger
///
/// Returns the path to the created directory.
pub fn save_artifacts(run: &BacktestRun, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("run_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("run.json"), export_json(run)?)?;
    std::fs::write(run_dir.join("report.md"), report::generate(run))?;
    std::fs::write(
        run_dir.join("history.csv"),
        export_history_csv(&run.result.snapshots)?,
    )?;
    std::fs::write(
        run_dir.join("investments.csv"),
        export_investments_csv(run.result.investment_log.entries())?,
    )?;

    Ok(run_dir)
}

/// Load a `BacktestRun` back from an artifact directory's run.json.
pub fn load_artifacts(run_dir: &Path) -> Result<BacktestRun> {
    let path = run_dir.join("run.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn history_csv_shape() {
        let snapshots = vec![
            DailySnapshot {
                date: d(2),
                total_value: 1_000_000.0,
                cash: 100.0,
                holdings_value: 999_900.0,
            },
            DailySnapshot {
                date: d(3),
                total_value: 1_010_000.0,
                cash: 100.0,
                holdings_value: 1_009_900.0,
            },
        ];
        let csv = export_history_csv(&snapshots).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "date,total_value,cash,holdings_value");
        assert_eq!(lines.next().unwrap(), "2024-01-02,1000000.00,100.00,999900.00");
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn investments_csv_shape() {
        let entries = vec![InvestmentLogEntry {
            date: d(8),
            amount: 1_000_000.0,
        }];
        let csv = export_investments_csv(&entries).unwrap();
        assert!(csv.starts_with("date,amount\n"));
        assert!(csv.contains("2024-01-08,1000000.00"));
    }

    fn empty_run() -> BacktestRun {
        use crate::config::BacktestConfig;
        use crate::metrics::PerformanceMetrics;
        use std::collections::BTreeMap;
        use topten_core::domain::InvestmentLog;
        use topten_core::sim::SimResult;

        let log = InvestmentLog::new();
        BacktestRun {
            schema_version: SCHEMA_VERSION,
            config: BacktestConfig::default(),
            result: SimResult {
                snapshots: Vec::new(),
                selections: BTreeMap::new(),
                investment_log: log.clone(),
                warnings: Vec::new(),
            },
            benchmark: Vec::new(),
            metrics: PerformanceMetrics::compute(&[], &log, None),
            fingerprint: String::new(),
        }
    }

    #[test]
    fn json_round_trip() {
        let run = empty_run();
        let json = export_json(&run).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
        assert_eq!(back.config, run.config);
    }

    #[test]
    fn import_rejects_future_schema() {
        let mut value: serde_json::Value =
            serde_json::from_str(&export_json(&empty_run()).unwrap()).unwrap();
        value["schema_version"] = serde_json::json!(SCHEMA_VERSION + 1);
        assert!(import_json(&value.to_string()).is_err());
    }

    #[test]
    fn artifact_bundle_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(&empty_run(), dir.path()).unwrap();

        assert!(run_dir.join("run.json").exists());
        assert!(run_dir.join("report.md").exists());
        assert!(run_dir.join("history.csv").exists());
        assert!(run_dir.join("investments.csv").exists());

        let back = load_artifacts(&run_dir).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }
}
