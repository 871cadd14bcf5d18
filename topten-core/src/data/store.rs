//! On-disk Parquet store for close series.
//!
//! Layout: `{store_dir}/ticker={TICKER}/closes.parquet` plus a `meta.json`
//! sidecar per ticker (hash, date range, source). Writes are atomic: write
//! to .tmp, rename into place. Corrupt files are quarantined on load.

use super::provider::{normalize_closes, ClosePrice, DataError, PriceProvider};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Metadata sidecar for a stored ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_count: usize,
    pub data_hash: String,
    pub source: String,
    pub stored_at: chrono::NaiveDateTime,
}

/// The Parquet store.
pub struct PriceStore {
    store_dir: PathBuf,
}

impl PriceStore {
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    fn ticker_dir(&self, ticker: &str) -> PathBuf {
        self.store_dir.join(format!("ticker={ticker}"))
    }

    fn closes_path(&self, ticker: &str) -> PathBuf {
        self.ticker_dir(ticker).join("closes.parquet")
    }

    fn meta_path(&self, ticker: &str) -> PathBuf {
        self.ticker_dir(ticker).join("meta.json")
    }

    /// Write a close series for a ticker, replacing any previous series.
    pub fn write(&self, ticker: &str, source: &str, closes: &[ClosePrice]) -> Result<(), DataError> {
        if closes.is_empty() {
            return Err(DataError::StoreError("no closes to store".into()));
        }

        let dir = self.ticker_dir(ticker);
        fs::create_dir_all(&dir)
            .map_err(|e| DataError::StoreError(format!("failed to create dir: {e}")))?;

        let df = closes_to_dataframe(closes)?;
        let path = self.closes_path(ticker);
        let tmp_path = path.with_extension("parquet.tmp");

        write_parquet(&df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::StoreError(format!("atomic rename failed: {e}"))
        })?;

        let meta = StoreMeta {
            ticker: ticker.to_string(),
            start_date: closes.first().expect("non-empty").date,
            end_date: closes.last().expect("non-empty").date,
            row_count: closes.len(),
            data_hash: blake3::hash(
                &serde_json::to_vec(closes)
                    .map_err(|e| DataError::StoreError(format!("hash serialization: {e}")))?,
            )
            .to_hex()
            .to_string(),
            source: source.to_string(),
            stored_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::StoreError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(ticker), meta_json)
            .map_err(|e| DataError::StoreError(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Load the stored close series for a ticker, sorted ascending.
    pub fn load(&self, ticker: &str) -> Result<Vec<ClosePrice>, DataError> {
        let path = self.closes_path(ticker);
        if !path.exists() {
            return Err(DataError::NoCachedData {
                ticker: ticker.to_string(),
            });
        }

        match load_and_validate_parquet(&path) {
            Ok(closes) => Ok(normalize_closes(closes)),
            Err(e) => {
                // Quarantine the corrupt file so the next run re-downloads.
                let quarantine = path.with_extension("parquet.quarantined");
                eprintln!(
                    "WARNING: quarantining corrupt store file {}: {e}",
                    path.display()
                );
                let _ = fs::rename(&path, &quarantine);
                Err(DataError::NoCachedData {
                    ticker: ticker.to_string(),
                })
            }
        }
    }

    /// Metadata for a stored ticker, if present.
    pub fn get_meta(&self, ticker: &str) -> Option<StoreMeta> {
        let content = fs::read_to_string(self.meta_path(ticker)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Per-ticker status for a set of tickers.
    pub fn status(&self, tickers: &[&str]) -> Vec<StoreStatus> {
        tickers
            .iter()
            .map(|t| {
                let meta = self.get_meta(t);
                StoreStatus {
                    ticker: t.to_string(),
                    stored: meta.is_some(),
                    start_date: meta.as_ref().map(|m| m.start_date),
                    end_date: meta.as_ref().map(|m| m.end_date),
                    row_count: meta.as_ref().map(|m| m.row_count),
                }
            })
            .collect()
    }

    /// Whether the stored series covers the requested range.
    pub fn covers_range(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> CoverageResult {
        match self.get_meta(ticker) {
            None => CoverageResult::NotStored,
            Some(meta) => {
                if meta.start_date <= start && meta.end_date >= end {
                    CoverageResult::FullyCovered
                } else {
                    CoverageResult::PartiallyCovered {
                        stored_start: meta.start_date,
                        stored_end: meta.end_date,
                    }
                }
            }
        }
    }
}

/// Store status for a single ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub ticker: String,
    pub stored: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub row_count: Option<usize>,
}

/// How well the store covers a requested date range.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageResult {
    NotStored,
    FullyCovered,
    PartiallyCovered {
        stored_start: NaiveDate,
        stored_end: NaiveDate,
    },
}

/// A provider wrapper that serves from the store when it covers the range
/// and falls through to the inner provider (writing back) otherwise.
pub struct CachingProvider<P> {
    inner: P,
    store: PriceStore,
    // Serializes write-backs when ensure_cached fetches in parallel.
    write_lock: Mutex<()>,
}

impl<P: PriceProvider> CachingProvider<P> {
    pub fn new(inner: P, store: PriceStore) -> Self {
        Self {
            inner,
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &PriceStore {
        &self.store
    }
}

impl<P: PriceProvider> PriceProvider for CachingProvider<P> {
    fn name(&self) -> &str {
        "caching-provider"
    }

    fn fetch_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClosePrice>, DataError> {
        if let CoverageResult::FullyCovered = self.store.covers_range(ticker, start, end) {
            if let Ok(closes) = self.store.load(ticker) {
                return Ok(closes
                    .into_iter()
                    .filter(|c| c.date >= start && c.date <= end)
                    .collect());
            }
        }

        let closes = self.inner.fetch_closes(ticker, start, end)?;
        if !closes.is_empty() {
            let _guard = self.write_lock.lock().expect("store write lock poisoned");
            self.store.write(ticker, self.inner.name(), &closes)?;
        }
        Ok(closes)
    }

    fn is_available(&self) -> bool {
        // The store half always answers; availability gates only the inner.
        true
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch")
}

fn closes_to_dataframe(closes: &[ClosePrice]) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = closes
        .iter()
        .map(|c| (c.date - epoch()).num_days() as i32)
        .collect();
    let values: Vec<f64> = closes.iter().map(|c| c.close).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("close".into(), values),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<ClosePrice>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    for col_name in ["date", "close"] {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    dataframe_to_closes(&df)
}

fn dataframe_to_closes(df: &DataFrame) -> Result<Vec<ClosePrice>, DataError> {
    let map_err = |e: PolarsError| DataError::ParquetError(format!("column read: {e}"));

    let dates = df.column("date").map_err(map_err)?;
    let values = df.column("close").map_err(map_err)?;

    let date_ca = dates
        .date()
        .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?;
    let close_ca = values
        .f64()
        .map_err(|e| DataError::ParquetError(format!("close column type: {e}")))?;

    let epoch = epoch();
    let mut closes = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let date_days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
        closes.push(ClosePrice {
            date: epoch + chrono::Duration::days(date_days as i64),
            close: close_ca.get(i).unwrap_or(f64::NAN),
        });
    }

    Ok(closes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_store_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("topten_store_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_closes() -> Vec<ClosePrice> {
        vec![
            ClosePrice {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                close: 79_600.0,
            },
            ClosePrice {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                close: 77_000.0,
            },
        ]
    }

    #[test]
    fn write_and_load_roundtrip() {
        let dir = temp_store_dir();
        let store = PriceStore::new(&dir);

        store.write("005930", "test", &sample_closes()).unwrap();
        let loaded = store.load("005930").unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(loaded[1].close, 77_000.0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let dir = temp_store_dir();
        let store = PriceStore::new(&dir);
        assert!(store.load("999999").is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn meta_and_coverage() {
        let dir = temp_store_dir();
        let store = PriceStore::new(&dir);
        store.write("005930", "test", &sample_closes()).unwrap();

        let meta = store.get_meta("005930").unwrap();
        assert_eq!(meta.row_count, 2);
        assert_eq!(meta.source, "test");

        assert_eq!(
            store.covers_range(
                "005930",
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ),
            CoverageResult::FullyCovered
        );
        assert!(matches!(
            store.covers_range(
                "005930",
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ),
            CoverageResult::PartiallyCovered { .. }
        ));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn status_query() {
        let dir = temp_store_dir();
        let store = PriceStore::new(&dir);
        store.write("005930", "test", &sample_closes()).unwrap();

        let statuses = store.status(&["005930", "000660"]);
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].stored);
        assert!(!statuses[1].stored);

        let _ = fs::remove_dir_all(&dir);
    }
}
