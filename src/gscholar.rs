//! Google Scholar citation lookup.
//!
//! Searches Scholar for `arXiv:<id>` and reads the "Cited by N" figure from
//! the result footer. Lookups are best-effort: every failure is logged and
//! reported as zero citations so an enrichment batch never aborts.

use crate::cookies::Cookie;
use crate::error::{ArxivError, Result};
use crate::http::{build_http_client, HttpSettings, BROWSER_USER_AGENT};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Google Scholar citation client
pub struct CitationClient {
    client: reqwest::Client,
    base_url: String,
    cookie_header: String,
}

impl CitationClient {
    /// Create a new client, passing `cookies` through on every request.
    pub fn new(settings: &HttpSettings, cookies: &[Cookie]) -> Result<Self> {
        let cookie_header = build_cookie_header(cookies);
        if cookie_header.is_empty() {
            debug!("No Google Scholar cookies loaded");
        }

        Ok(Self {
            client: build_http_client(settings, BROWSER_USER_AGENT)?,
            base_url: DEFAULT_SCHOLAR_URL.to_string(),
            cookie_header,
        })
    }

    /// Use a Scholar mirror (or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Citation count for an arXiv id; 0 when it cannot be determined.
    pub async fn citation_count(&self, arxiv_id: &str) -> u32 {
        match self.lookup(arxiv_id).await {
            Ok(Some(count)) => count,
            Ok(None) => {
                debug!(paper_id = arxiv_id, "No citation figure on Scholar page");
                0
            }
            Err(e) => {
                warn!(paper_id = arxiv_id, error = %e, "Citation lookup failed");
                0
            }
        }
    }

    async fn lookup(&self, arxiv_id: &str) -> Result<Option<u32>> {
        let url = build_citation_url(&self.base_url, arxiv_id)?;
        let html = self.fetch_page(&url).await?;

        if html.contains("Solving the above CAPTCHA") || html.contains("unusual traffic") {
            return Err(ArxivError::Captcha);
        }

        parse_cited_by(&html)
    }

    async fn fetch_page(&self, url: &Url) -> Result<String> {
        let mut request = self
            .client
            .get(url.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5");

        if !self.cookie_header.is_empty() {
            request = request.header("Cookie", self.cookie_header.as_str());
        }

        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ArxivError::RateLimited(60));
        }

        if !status.is_success() {
            return Err(ArxivError::Api {
                code: status.as_u16() as i32,
                message: format!("HTTP error: {}", status),
            });
        }

        Ok(response.text().await?)
    }
}

/// Build cookie header string from the Google cookies in `cookies`
fn build_cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .filter(|c| c.domain.contains("google"))
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Scholar search URL for one arXiv id
fn build_citation_url(base_url: &str, arxiv_id: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/scholar", base_url))
        .map_err(|e| ArxivError::Config(format!("Invalid base URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("hl", "en")
        .append_pair("as_sdt", "0,5")
        .append_pair("q", &format!("arXiv:{}", arxiv_id))
        .append_pair("btnG", "");

    Ok(url)
}

/// Extract the first "Cited by N" figure from a Scholar result page.
pub fn parse_cited_by(html: &str) -> Result<Option<u32>> {
    let document = Html::parse_document(html);
    let footer_selector =
        Selector::parse("div.gs_fl").map_err(|e| ArxivError::Parse(e.to_string()))?;
    let cite_regex =
        Regex::new(r"Cited by\s*(\d+)").map_err(|e| ArxivError::Parse(e.to_string()))?;

    let count = document
        .select(&footer_selector)
        .map(|footer| footer.text().collect::<String>())
        .find_map(|text| {
            cite_regex
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok())
        });

    Ok(count)
}
