//! Runtime settings.
//!
//! Built by the binary from CLI flags (with environment fallbacks); library
//! users can start from [`Settings::default`].

use crate::enrich::DelayRange;
use crate::http::HttpSettings;
use crate::store::DEFAULT_FRESHNESS_DAYS;
use std::path::PathBuf;
use std::time::Duration;

/// Directory, under the platform data dir, holding the paper database
const DATA_DIR_NAME: &str = "rustarxiv";

/// Database file name
const DB_FILE_NAME: &str = "papers.db";

/// Default directory for per-run output files
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Endpoint and timing constants.
pub mod defaults {
    use std::time::Duration;

    /// Request timeout for every external call.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Lower bound of the pause between enriched papers.
    pub const MIN_ENRICH_DELAY: Duration = Duration::from_secs(2);

    /// Upper bound of the pause between enriched papers.
    pub const MAX_ENRICH_DELAY: Duration = Duration::from_secs(4);
}

/// Default database location: `<data dir>/rustarxiv/papers.db`
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(DATA_DIR_NAME))
        .join(DB_FILE_NAME)
}

/// Everything a run needs to know about its environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub results_dir: PathBuf,
    pub freshness_days: i64,
    pub http: HttpSettings,
    pub enrich_delay: DelayRange,
    pub arxiv_url: String,
    pub scholar_url: String,
    /// Twitter API bearer token; mentions are estimated without it
    pub twitter_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            freshness_days: DEFAULT_FRESHNESS_DAYS,
            http: HttpSettings {
                timeout: defaults::REQUEST_TIMEOUT,
                connect_timeout: defaults::CONNECT_TIMEOUT,
                proxy: None,
            },
            enrich_delay: DelayRange::new(defaults::MIN_ENRICH_DELAY, defaults::MAX_ENRICH_DELAY),
            arxiv_url: crate::arxiv::DEFAULT_ARXIV_URL.to_string(),
            scholar_url: crate::gscholar::DEFAULT_SCHOLAR_URL.to_string(),
            twitter_token: None,
        }
    }
}

impl Settings {
    /// Override the request timeout (seconds).
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.http.timeout = Duration::from_secs(secs);
        self
    }
}
