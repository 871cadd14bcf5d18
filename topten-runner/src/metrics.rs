//! Performance metrics — pure functions over the snapshot curve and ledger.
//!
//! Every metric is a pure function: value curve and/or invested capital in,
//! scalar out. No dependencies on the runner or the data pipeline.
//!
//! Returns are computed against *invested* capital, not the initial value:
//! with monthly contributions the curve grows from cash injections as well
//! as market movement, so `(final - initial) / initial` would be nonsense.

use serde::{Deserialize, Serialize};
use topten_core::domain::{DailySnapshot, InvestmentLog};
use topten_core::sim::BenchmarkPoint;

/// Aggregate metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_invested: f64,
    pub final_value: f64,
    pub net_profit: f64,
    /// (final - invested) / invested.
    pub total_return: f64,
    pub cagr: f64,
    /// Negative fraction, e.g. -0.15 for a 15% drawdown.
    pub max_drawdown: f64,
    pub trading_days: usize,
    pub benchmark_final_value: Option<f64>,
    pub benchmark_return: Option<f64>,
}

impl PerformanceMetrics {
    /// Compute all metrics from the snapshot curve, the ledger, and an
    /// optional benchmark curve sharing the same date axis.
    pub fn compute(
        snapshots: &[DailySnapshot],
        log: &InvestmentLog,
        benchmark: Option<&[BenchmarkPoint]>,
    ) -> Self {
        let values: Vec<f64> = snapshots.iter().map(|s| s.total_value).collect();
        let total_invested = log.total_invested();
        let final_value = values.last().copied().unwrap_or(0.0);

        let benchmark_final_value = benchmark
            .and_then(|curve| curve.last())
            .map(|point| point.total_value);
        let benchmark_return =
            benchmark_final_value.map(|v| return_on_invested(v, total_invested));

        Self {
            total_invested,
            final_value,
            net_profit: final_value - total_invested,
            total_return: return_on_invested(final_value, total_invested),
            cagr: cagr_on_invested(&values, total_invested),
            max_drawdown: max_drawdown(&values),
            trading_days: values.len(),
            benchmark_final_value,
            benchmark_return,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Simple return on invested capital: (final - invested) / invested.
pub fn return_on_invested(final_value: f64, total_invested: f64) -> f64 {
    if total_invested <= 0.0 {
        return 0.0;
    }
    (final_value - total_invested) / total_invested
}

/// Compound annual growth against invested capital.
///
/// Assumes 252 trading days per year. This understates true money-weighted
/// growth (later contributions had less time in the market) but is the
/// conventional headline figure for a DCA strategy.
pub fn cagr_on_invested(values: &[f64], total_invested: f64) -> f64 {
    if values.len() < 2 || total_invested <= 0.0 {
        return 0.0;
    }
    let final_value = *values.last().expect("len checked above");
    if final_value <= 0.0 {
        return 0.0;
    }
    let years = values.len() as f64 / 252.0;
    if years <= 0.0 {
        return 0.0;
    }
    (final_value / total_invested).powf(1.0 / years) - 1.0
}

/// Maximum drawdown as a negative fraction against the rolling peak.
///
/// Returns 0.0 for a constant or monotonically increasing curve.
pub fn max_drawdown(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mut peak = values[0];
    let mut max_dd = 0.0_f64;

    for &value in values {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}
