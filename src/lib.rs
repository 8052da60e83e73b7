//! # rustarxiv
//!
//! arXiv literature pipeline: keyword search, citation/mention enrichment,
//! a local paper store and an interactive HTML report.
//!
//! ## Modules
//!
//! - [`arxiv`] - arXiv API search and Atom parsing
//! - [`gscholar`] - Google Scholar "Cited by" lookup
//! - [`mentions`] - Twitter mention counts (or a stable estimate)
//! - [`enrich`] - Rate-limited metric enrichment
//! - [`store`] - Paper store with freshness-aware upserts
//! - [`report`] - Self-contained HTML report
//! - [`export`] - Per-run text/JSON/CSV files
//! - [`pipeline`] - Collection and refresh runs
//! - [`cookies`] - Cookie persistence
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustarxiv::arxiv::{ArxivClient, QueryOptions};
//! use rustarxiv::http::HttpSettings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ArxivClient::new(&HttpSettings::default())?;
//!     let feed = client
//!         .search(&["prompt injection".to_string()], &QueryOptions::default())
//!         .await?;
//!     for paper in feed {
//!         println!("{}", paper?.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod arxiv;
pub mod config;
pub mod cookies;
pub mod enrich;
pub mod error;
pub mod export;
pub mod gscholar;
pub mod http;
pub mod mentions;
pub mod paper;
pub mod pipeline;
pub mod report;
pub mod store;

pub use error::{ArxivError, Result};
pub use paper::Paper;
