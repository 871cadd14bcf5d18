//! Market data: provider trait, ranked fallback chain, HTTP and synthetic
//! providers, on-disk Parquet store, and the download orchestrator.

pub mod chain;
pub mod download;
pub mod naver;
pub mod provider;
pub mod store;
pub mod synthetic;

pub use chain::ProviderChain;
pub use download::{download_tickers, DownloadSummary};
pub use naver::NaverProvider;
pub use provider::{ClosePrice, DataError, FetchProgress, PriceProvider, StdoutProgress};
pub use store::{CachingProvider, CoverageResult, PriceStore, StoreMeta, StoreStatus};
pub use synthetic::SyntheticProvider;
