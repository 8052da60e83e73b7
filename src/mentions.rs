//! Social-mention signal.
//!
//! Without Twitter credentials the count is a stable pseudo-estimate seeded
//! from the arXiv id; with a bearer token it comes from the recent-search API.

use crate::error::{ArxivError, Result};
use crate::http::{build_http_client, HttpSettings};
use md5::{Digest, Md5};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

/// Upper bound (inclusive) of the estimated mention count
pub const MAX_ESTIMATED_MENTIONS: u32 = 50;

/// Default Twitter API base
pub const DEFAULT_TWITTER_URL: &str = "https://api.twitter.com";

/// Twitter recent search caps a page at 100 tweets
const TWITTER_PAGE_SIZE: u32 = 100;

/// Deterministic stand-in for a real mention count.
///
/// The MD5 digest of the id seeds a fixed-algorithm ChaCha8 generator, so the
/// same id always maps to the same value in `0..=50` across rand releases.
pub fn estimate_mentions(arxiv_id: &str) -> u32 {
    let digest = Md5::digest(arxiv_id.as_bytes());
    let mut seed = [0u8; 32];
    seed[..16].copy_from_slice(&digest);
    seed[16..].copy_from_slice(&digest);

    let mut rng = ChaCha8Rng::from_seed(seed);
    rng.gen_range(0..=MAX_ESTIMATED_MENTIONS)
}

/// Where mention counts come from
pub enum MentionSource {
    /// Hash-seeded estimate
    Estimated,
    /// Twitter recent-search lookup
    Twitter(TwitterClient),
}

impl MentionSource {
    /// Mention count for an arXiv id. Lookup failures count as 0.
    pub async fn mentions(&self, arxiv_id: &str) -> u32 {
        match self {
            MentionSource::Estimated => {
                let count = estimate_mentions(arxiv_id);
                debug!(paper_id = arxiv_id, count, "Estimated mentions");
                count
            }
            MentionSource::Twitter(client) => match client.count(arxiv_id).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(paper_id = arxiv_id, error = %e, "Twitter lookup failed");
                    0
                }
            },
        }
    }
}

/// Twitter API v2 client using an app bearer token
pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    meta: Option<SearchMeta>,
}

#[derive(Debug, Deserialize)]
struct SearchMeta {
    result_count: Option<u32>,
}

impl TwitterClient {
    pub fn new(settings: &HttpSettings, token: impl Into<String>) -> Result<Self> {
        let user_agent = format!("rustarxiv/{}", env!("CARGO_PKG_VERSION"));
        Ok(Self {
            client: build_http_client(settings, &user_agent)?,
            base_url: DEFAULT_TWITTER_URL.to_string(),
            token: token.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Number of recent tweets mentioning the id (one page at most).
    pub async fn count(&self, arxiv_id: &str) -> Result<u32> {
        let mut url = Url::parse(&format!("{}/2/tweets/search/recent", self.base_url))
            .map_err(|e| ArxivError::Config(format!("Invalid Twitter URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("query", &format!("\"{}\"", arxiv_id))
            .append_pair("max_results", &TWITTER_PAGE_SIZE.to_string());

        let response = self.client.get(url).bearer_auth(&self.token).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ArxivError::RateLimited(900));
        }
        if !status.is_success() {
            return Err(ArxivError::Api {
                code: status.as_u16() as i32,
                message: format!("Twitter API error: {}", status),
            });
        }

        let body: SearchResponse = response.json().await?;
        let count = body
            .meta
            .and_then(|m| m.result_count)
            .unwrap_or(body.data.len() as u32);
        debug!(paper_id = arxiv_id, count, "Twitter mentions");
        Ok(count)
    }
}
