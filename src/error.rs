//! Custom error types for rustarxiv.
//!
//! Library functions return `Result<T, ArxivError>`. Enrichment failures never
//! reach this type: they are logged and degraded to a default count where they
//! happen.

use thiserror::Error;

/// Main error type for rustarxiv operations.
#[derive(Debug, Error)]
pub enum ArxivError {
    /// Network/HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The arXiv search endpoint answered with a non-success status
    #[error("arXiv search failed: {status} - {message}")]
    Fetch {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Malformed Atom feed or Scholar page
    #[error("Parse error: {0}")]
    Parse(String),

    /// Scholar or Twitter answered 429
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Scholar or Twitter answered with a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status
        code: i32,
        /// Status line or API message
        message: String,
    },

    /// Scholar served its bot check instead of results
    #[error("Scholar CAPTCHA page, import fresh cookies")]
    Captcha,

    /// Paper store backend error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Keyword, cookie or output file I/O
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document or export (de)serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Bad endpoint, proxy or path setting
    #[error("Config error: {0}")]
    Config(String),

    /// Rejected user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A collection run produced nothing that can be stored
    #[error("No usable papers: {0}")]
    NoPapers(String),
}

/// Crate-wide result
pub type Result<T> = std::result::Result<T, ArxivError>;
