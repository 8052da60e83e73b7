//! Shared HTTP client construction.
//!
//! Every outbound client carries an explicit request and connect timeout so a
//! stalled upstream can never block a run indefinitely.

use crate::error::{ArxivError, Result};
use std::time::Duration;

/// Browser-like user agent; Google Scholar rejects obvious bots.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Transport settings applied to every client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Whole-request timeout
    pub timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Proxy URL (e.g., "http://127.0.0.1:7890")
    pub proxy: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            proxy: None,
        }
    }
}

/// Build an HTTP client with the given user agent and optional proxy.
pub fn build_http_client(settings: &HttpSettings, user_agent: &str) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .cookie_store(true);

    if let Some(proxy_url) = settings.proxy.as_deref() {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            ArxivError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ArxivError::Config(format!("Failed to build HTTP client: {}", e)))
}
