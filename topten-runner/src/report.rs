//! Markdown report generator.

use crate::metrics::PerformanceMetrics;
use crate::runner::BacktestRun;

/// Format a KRW amount with thousands separators, rounded to whole won.
fn krw(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let negative = rounded < 0;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Render a single run as a Markdown report.
pub fn generate(run: &BacktestRun) -> String {
    let metrics = &run.metrics;
    let snapshots = &run.result.snapshots;

    let mut report = format!(
        "# Top {} Equal-Weight Rebalancing Strategy Report\n\n\
**Period:** {} ~ {}\n\
**Initial Capital:** {} KRW\n\
**Monthly Contribution:** {} KRW\n\n",
        run.config.top_n,
        snapshots.first().map(|s| s.date.to_string()).unwrap_or_default(),
        snapshots.last().map(|s| s.date.to_string()).unwrap_or_default(),
        krw(run.config.initial_capital),
        krw(run.config.monthly_contribution),
    );

    report.push_str("## Performance Summary\n");
    push_summary(&mut report, metrics);

    if !run.result.warnings.is_empty() {
        report.push_str("\n## Warnings\n");
        for warning in &run.result.warnings {
            report.push_str(&format!("- {warning}\n"));
        }
    }

    report.push_str("\n## Yearly Selections\n");
    report.push_str("| Year | Selected Stocks (Jan) |\n");
    report.push_str("|---|---|\n");
    for (year, picks) in &run.result.selections {
        let names: Vec<&str> = picks.iter().map(|c| c.name.as_str()).collect();
        report.push_str(&format!("| {} | {} |\n", year, names.join(", ")));
    }

    report.push_str(&format!(
        "\n## Run\n- Fingerprint: `{}`\n- Trading days: {}\n\
- Equity curve and investment log are exported alongside this report.\n",
        run.fingerprint, metrics.trading_days
    ));

    report
}

fn push_summary(report: &mut String, metrics: &PerformanceMetrics) {
    report.push_str(&format!(
        "- **Total Invested Capital:** {} KRW\n",
        krw(metrics.total_invested)
    ));
    report.push_str(&format!(
        "- **Final Portfolio Value:** {} KRW\n",
        krw(metrics.final_value)
    ));
    report.push_str(&format!("- **Net Profit:** {} KRW\n", krw(metrics.net_profit)));
    report.push_str(&format!(
        "- **Total Return (on Invested):** {:.2}%\n",
        metrics.total_return * 100.0
    ));
    report.push_str(&format!("- **CAGR:** {:.2}%\n", metrics.cagr * 100.0));
    report.push_str(&format!(
        "- **Max Drawdown (MDD):** {:.2}%\n",
        metrics.max_drawdown * 100.0
    ));
    if let (Some(value), Some(ret)) = (metrics.benchmark_final_value, metrics.benchmark_return) {
        report.push_str(&format!(
            "- **Benchmark (KODEX 200 DCA) Value:** {} KRW\n",
            krw(value)
        ));
        report.push_str(&format!("- **Benchmark Return:** {:.2}%\n", ret * 100.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn krw_grouping() {
        assert_eq!(krw(0.0), "0");
        assert_eq!(krw(999.0), "999");
        assert_eq!(krw(1_000.0), "1,000");
        assert_eq!(krw(1_234_567.4), "1,234,567");
        assert_eq!(krw(-1_234_567.0), "-1,234,567");
        assert_eq!(krw(1_000_000_000.0), "1,000,000,000");
    }

    #[test]
    fn krw_rounds_to_whole_won() {
        assert_eq!(krw(999.6), "1,000");
        assert_eq!(krw(-0.4), "0");
    }
}
