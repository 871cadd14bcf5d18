//! TopTen CLI — run, download, and cache management commands.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config (or the built-in defaults)
//! - `download` — fetch close series from Naver Finance into the Parquet store
//! - `cache status` — report stored tickers, date ranges, row counts

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use topten_core::data::provider::{ClosePrice, DataError};
use topten_core::data::{
    download_tickers, CachingProvider, NaverProvider, PriceProvider, PriceStore, ProviderChain,
    StdoutProgress, SyntheticProvider,
};
use topten_runner::{historical_top10, run_backtest, save_artifacts, BacktestConfig, BacktestRun};

#[derive(Parser)]
#[command(
    name = "topten",
    about = "TopTen CLI — top-N equal-weight rebalancing backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file (defaults apply without one).
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Offline mode: serve prices from the local store only.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Append a deterministic synthetic provider as a last resort.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Price store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Output directory for the artifact bundle.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Download close series from Naver Finance into the Parquet store.
    Download {
        /// Tickers to download (e.g., 005930 000660). Defaults to every
        /// ticker in the built-in top-10 history plus the reference and
        /// benchmark tickers.
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 10 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Force re-download even if the range is already covered.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Price store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Store management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report stored tickers, date ranges, and row counts.
    Status {
        /// Price store directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            offline,
            synthetic,
            cache_dir,
            output_dir,
        } => run_cmd(config, offline, synthetic, cache_dir, output_dir),
        Commands::Download {
            tickers,
            start,
            end,
            force,
            cache_dir,
        } => download_cmd(tickers, start, end, force, cache_dir),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => cache_status_cmd(&cache_dir),
        },
    }
}

/// Serves closes from the local store only; never touches the network.
struct StoreOnlyProvider {
    store: PriceStore,
}

impl PriceProvider for StoreOnlyProvider {
    fn name(&self) -> &str {
        "store-only"
    }

    fn fetch_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClosePrice>, DataError> {
        let closes = self.store.load(ticker)?;
        Ok(closes
            .into_iter()
            .filter(|c| c.date >= start && c.date <= end)
            .collect())
    }
}

/// Assemble the provider chain for a run.
///
/// Online: Parquet store with Naver write-through. Offline: store only.
/// `--synthetic` appends a deterministic generator as the final fallback.
fn build_provider(offline: bool, synthetic: bool, cache_dir: &Path) -> Arc<dyn PriceProvider> {
    let mut providers: Vec<Arc<dyn PriceProvider>> = Vec::new();

    if offline {
        providers.push(Arc::new(StoreOnlyProvider {
            store: PriceStore::new(cache_dir),
        }));
    } else {
        providers.push(Arc::new(CachingProvider::new(
            NaverProvider::new(),
            PriceStore::new(cache_dir),
        )));
    }
    if synthetic {
        providers.push(Arc::new(SyntheticProvider::new(42)));
    }

    Arc::new(ProviderChain::new(providers))
}

fn run_cmd(
    config_path: Option<PathBuf>,
    offline: bool,
    synthetic: bool,
    cache_dir: PathBuf,
    output_dir: PathBuf,
) -> Result<()> {
    let config = match config_path {
        Some(path) => BacktestConfig::load(&path)?,
        None => BacktestConfig::default(),
    };

    let provider = build_provider(offline, synthetic, &cache_dir);
    let today = chrono::Local::now().date_naive();

    println!("Running top-{} rebalancing backtest...", config.top_n);
    let run = run_backtest(&config, provider, today, &StdoutProgress)?;

    print_summary(&run);
    if synthetic {
        println!("WARNING: synthetic fallback was enabled; results may not reflect market data");
    }

    let run_dir = save_artifacts(&run, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn download_cmd(
    tickers: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    let config = BacktestConfig::default();
    let tickers = if tickers.is_empty() {
        let mut all = historical_top10()?.all_tickers();
        for extra in [&config.reference_ticker, &config.benchmark_ticker] {
            if !all.contains(extra) {
                all.push(extra.clone());
            }
        }
        all.sort();
        all
    } else {
        tickers
    };

    let start_date = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive() - chrono::Duration::days(365 * 10));
    let end_date = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let provider = NaverProvider::new();
    let store = PriceStore::new(&cache_dir);
    let ticker_refs: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

    let summary = download_tickers(
        &provider,
        &store,
        &ticker_refs,
        start_date,
        end_date,
        force,
        &StdoutProgress,
    );

    if !summary.all_succeeded() {
        for (ticker, err) in &summary.errors {
            eprintln!("Error for {ticker}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn cache_status_cmd(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Store directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let store = PriceStore::new(cache_dir);
    let mut tickers: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(cache_dir)? {
        let name = entry?.file_name().to_string_lossy().to_string();
        if let Some(ticker) = name.strip_prefix("ticker=") {
            tickers.push(ticker.to_string());
        }
    }

    if tickers.is_empty() {
        println!("Store is empty: {}", cache_dir.display());
        return Ok(());
    }
    tickers.sort();

    let ticker_refs: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();
    let statuses = store.status(&ticker_refs);

    println!("Store: {}", cache_dir.display());
    println!("Tickers: {}", statuses.len());
    println!();
    println!("{:<8} {:<25} {:>8}", "Ticker", "Date Range", "Rows");
    println!("{}", "-".repeat(43));
    for status in &statuses {
        let range = match (status.start_date, status.end_date) {
            (Some(start), Some(end)) => format!("{start} to {end}"),
            _ => "(no meta)".to_string(),
        };
        println!(
            "{:<8} {:<25} {:>8}",
            status.ticker,
            range,
            status.row_count.unwrap_or(0)
        );
    }

    Ok(())
}

fn print_summary(run: &BacktestRun) {
    let metrics = &run.metrics;
    println!();
    println!("=== Backtest Result ===");
    if let (Some(first), Some(last)) = (run.result.snapshots.first(), run.result.snapshots.last()) {
        println!("Period:          {} to {}", first.date, last.date);
    }
    println!("Trading days:    {}", metrics.trading_days);
    println!("Rebalances:      {}", run.result.selections.len());
    println!();
    println!("--- Performance ---");
    println!("Total Invested:  {:.0} KRW", metrics.total_invested);
    println!("Final Value:     {:.0} KRW", metrics.final_value);
    println!("Net Profit:      {:.0} KRW", metrics.net_profit);
    println!("Total Return:    {:.2}%", metrics.total_return * 100.0);
    println!("CAGR:            {:.2}%", metrics.cagr * 100.0);
    println!("Max Drawdown:    {:.2}%", metrics.max_drawdown * 100.0);
    if let (Some(value), Some(ret)) = (metrics.benchmark_final_value, metrics.benchmark_return) {
        println!("Benchmark Value: {value:.0} KRW");
        println!("Benchmark Ret.:  {:.2}%", ret * 100.0);
    }
    for warning in &run.result.warnings {
        println!("WARNING: {warning}");
    }
    println!();
    println!("Fingerprint: {}", run.fingerprint);
}
