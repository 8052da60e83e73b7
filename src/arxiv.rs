//! arXiv search client.
//!
//! Builds a keyword OR-query bounded by a submission date window, fetches the
//! Atom response and exposes it as a lazy [`PaperFeed`] of [`Paper`] records,
//! newest submissions first.

use crate::error::{ArxivError, Result};
use crate::http::{build_http_client, HttpSettings};
use crate::paper::Paper;
use chrono::{DateTime, Months, NaiveTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::io::Cursor;
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use url::Url;

/// Default arXiv export API endpoint
pub const DEFAULT_ARXIV_URL: &str = "http://export.arxiv.org/api/query";

/// Landing page prefix used when an entry carries no alternate link
const ABS_URL_PREFIX: &str = "https://arxiv.org/abs/";

/// Timestamp layout of the `submittedDate` range
const SUBMITTED_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Identifier patterns, tried in order; the first match wins.
const ID_PATTERNS: &[&str] = &[
    r"arxiv\.org/abs/(\d+\.\d+)",
    r"arxiv\.org/pdf/(\d+\.\d+)",
    r"/(\d+\.\d+)$",
    r"arXiv:(\d+\.\d+)",
];

/// Search options for a collection run
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum number of entries requested
    pub max_results: u32,
    /// Lookback window in calendar months
    pub months_back: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            months_back: 3,
        }
    }
}

/// arXiv API client
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivClient {
    /// Create a client against the public arXiv endpoint.
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let user_agent = format!("rustarxiv/{}", env!("CARGO_PKG_VERSION"));
        Ok(Self {
            client: build_http_client(settings, &user_agent)?,
            base_url: DEFAULT_ARXIV_URL.to_string(),
        })
    }

    /// Point the client at another endpoint (mirrors, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search arXiv for papers matching any of `keywords`.
    ///
    /// # Errors
    ///
    /// Returns [`ArxivError::Fetch`] if the service answers with a non-success
    /// status. A successful answer without entries gives an empty feed.
    pub async fn search(&self, keywords: &[String], options: &QueryOptions) -> Result<PaperFeed> {
        let query = build_search_query(keywords, Utc::now(), options.months_back)?;
        let url = build_search_url(&self.base_url, &query, options.max_results)?;

        info!(
            keywords = %keywords.join(", "),
            months_back = options.months_back,
            max_results = options.max_results,
            "Searching arXiv"
        );
        debug!(url = %url, "arXiv request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArxivError::Fetch {
                status: status.as_u16(),
                message: format!("HTTP error: {}", status),
            });
        }

        let body = response.text().await?;
        Ok(PaperFeed::from_xml(body))
    }
}

/// Build the arXiv `search_query` expression.
///
/// `(all:kw1 OR all:kw2) AND submittedDate:[<from> TO <to>]`, where the range
/// runs from the start of the day `months_back` months ago to the end of today.
pub fn build_search_query(
    keywords: &[String],
    now: DateTime<Utc>,
    months_back: u32,
) -> Result<String> {
    let terms: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| {
            if k.contains(char::is_whitespace) {
                format!("all:\"{}\"", k)
            } else {
                format!("all:{}", k)
            }
        })
        .collect();

    if terms.is_empty() {
        return Err(ArxivError::Validation(
            "at least one keyword is required".to_string(),
        ));
    }

    let past = now
        .checked_sub_months(Months::new(months_back))
        .ok_or_else(|| ArxivError::Validation(format!("lookback of {} months is out of range", months_back)))?;
    let from = past.date_naive().and_time(NaiveTime::MIN);
    let to = now
        .date_naive()
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| ArxivError::Validation("invalid end of day".to_string()))?;

    Ok(format!(
        "({}) AND submittedDate:[{} TO {}]",
        terms.join(" OR "),
        from.format(SUBMITTED_DATE_FORMAT),
        to.format(SUBMITTED_DATE_FORMAT)
    ))
}

/// Build the request URL, newest submissions first.
fn build_search_url(base_url: &str, query: &str, max_results: u32) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ArxivError::Config(format!("Invalid arXiv URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("search_query", query)
        .append_pair("start", "0")
        .append_pair("max_results", &max_results.to_string())
        .append_pair("sortBy", "submittedDate")
        .append_pair("sortOrder", "descending");

    Ok(url)
}

fn id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| ID_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect())
}

/// Extract an arXiv identifier from a link or id string.
pub fn extract_arxiv_id(text: &str) -> Option<String> {
    id_patterns()
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Collapse runs of whitespace (titles and abstracts wrap in the feed).
fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Entry under construction
#[derive(Default)]
struct EntryDraft {
    id: String,
    title: String,
    summary: String,
    published: String,
    doi: Option<String>,
    authors: Vec<String>,
    categories: Vec<String>,
    pdf_link: Option<String>,
    alternate_link: Option<String>,
    in_author: bool,
}

impl EntryDraft {
    fn on_element(&mut self, name: &str, attrs: &[(String, String)]) {
        let attr = |key: &str| {
            attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        match name {
            "author" => self.in_author = true,
            "category" => {
                if let Some(term) = attr("term") {
                    self.categories.push(term);
                }
            }
            "link" => {
                let href = attr("href");
                if attr("title").as_deref() == Some("pdf") {
                    self.pdf_link = href;
                } else if attr("rel").as_deref() == Some("alternate") {
                    self.alternate_link = href;
                }
            }
            _ => {}
        }
    }

    fn on_close(&mut self, name: &str, text: String) {
        match name {
            "id" => self.id = text,
            "title" => self.title = normalize_ws(&text),
            "summary" => self.summary = normalize_ws(&text),
            "published" => self.published = text,
            "doi" if !text.is_empty() => self.doi = Some(text),
            "name" if self.in_author && !text.is_empty() => self.authors.push(text),
            "author" => self.in_author = false,
            _ => {}
        }
    }

    fn into_paper(self) -> Paper {
        let paper_id = self
            .pdf_link
            .as_deref()
            .and_then(extract_arxiv_id)
            .or_else(|| self.alternate_link.as_deref().and_then(extract_arxiv_id))
            .or_else(|| extract_arxiv_id(&self.id));

        let abstract_link = self
            .alternate_link
            .or_else(|| paper_id.as_ref().map(|id| format!("{}{}", ABS_URL_PREFIX, id)));

        let published = DateTime::parse_from_rfc3339(&self.published)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| {
                warn!(entry = %self.id, value = %self.published, error = %e, "Unparseable published date");
            })
            .ok();

        let mut paper = Paper {
            paper_id,
            title: self.title,
            authors: self.authors,
            published,
            abstract_text: self.summary,
            pdf_link: self.pdf_link,
            abstract_link,
            cross_ref_id: self.doi,
            ..Default::default()
        };
        for term in &self.categories {
            paper.add_category(term);
        }
        paper
    }
}

/// One pull-parser step with the borrowed event data copied out.
enum Step {
    Open(String, Vec<(String, String)>),
    Leaf(String, Vec<(String, String)>),
    Text(String),
    Close(String),
    Skip,
    Eof,
    Failed(String),
}

fn element_parts(e: &BytesStart<'_>) -> (String, Vec<(String, String)>) {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let attrs = e
        .attributes()
        .flatten()
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.local_name().as_ref()).into_owned();
            let value = a.unescape_value().map(|v| v.into_owned()).unwrap_or_else(|e| {
                warn!(attribute = %key, error = %e, "Bad entity in attribute, keeping raw value");
                String::from_utf8_lossy(&a.value).into_owned()
            });
            (key, value)
        })
        .collect();
    (name, attrs)
}

/// Lazy sequence of papers parsed from an arXiv Atom response.
///
/// Entries are parsed on demand; the feed is finite and cannot be restarted.
/// Malformed XML ends the feed with a single [`ArxivError::Parse`].
pub struct PaperFeed {
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    text: String,
    entry: Option<EntryDraft>,
    total_results: Option<u64>,
    done: bool,
}

impl PaperFeed {
    /// Wrap a raw Atom document.
    pub fn from_xml(body: impl Into<String>) -> Self {
        let mut reader = Reader::from_reader(Cursor::new(body.into().into_bytes()));
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            text: String::new(),
            entry: None,
            total_results: None,
            done: false,
        }
    }

    /// `opensearch:totalResults`, once the feed header has been read.
    pub fn total_results(&self) -> Option<u64> {
        self.total_results
    }

    fn step(&mut self) -> Step {
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(Event::Start(e)) => {
                let (name, attrs) = element_parts(&e);
                Step::Open(name, attrs)
            }
            Ok(Event::Empty(e)) => {
                let (name, attrs) = element_parts(&e);
                Step::Leaf(name, attrs)
            }
            Ok(Event::Text(t)) => Step::Text(t.unescape().map(|s| s.into_owned()).unwrap_or_else(|e| {
                warn!(error = %e, "Bad entity in text, keeping raw text");
                String::from_utf8_lossy(&t).into_owned()
            })),
            Ok(Event::CData(t)) => Step::Text(String::from_utf8_lossy(&t).into_owned()),
            Ok(Event::End(e)) => Step::Close(String::from_utf8_lossy(e.local_name().as_ref()).into_owned()),
            Ok(Event::Eof) => Step::Eof,
            Ok(_) => Step::Skip,
            Err(e) => Step::Failed(format!(
                "invalid arXiv response at byte {}: {}",
                self.reader.buffer_position(),
                e
            )),
        }
    }
}

impl Iterator for PaperFeed {
    type Item = Result<Paper>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.step() {
                Step::Open(name, attrs) => {
                    self.text.clear();
                    if name == "entry" {
                        self.entry = Some(EntryDraft::default());
                    } else if let Some(entry) = self.entry.as_mut() {
                        entry.on_element(&name, &attrs);
                    }
                }
                Step::Leaf(name, attrs) => {
                    if let Some(entry) = self.entry.as_mut() {
                        entry.on_element(&name, &attrs);
                    }
                }
                Step::Text(text) => self.text.push_str(&text),
                Step::Close(name) => {
                    let text = std::mem::take(&mut self.text).trim().to_string();
                    if name == "entry" {
                        if let Some(entry) = self.entry.take() {
                            let paper = entry.into_paper();
                            debug!(paper_id = ?paper.paper_id, title = %paper.title, "Parsed entry");
                            return Some(Ok(paper));
                        }
                    } else if let Some(entry) = self.entry.as_mut() {
                        entry.on_close(&name, text);
                    } else if name == "totalResults" {
                        self.total_results = text.parse().ok();
                        if let Some(total) = self.total_results {
                            info!(total, "arXiv reports matching papers");
                        }
                    }
                }
                Step::Skip => {}
                Step::Eof => self.done = true,
                Step::Failed(message) => {
                    self.done = true;
                    return Some(Err(ArxivError::Parse(message)));
                }
            }
        }
        None
    }
}
