//! Paper record shared by every pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One arXiv paper plus its derived popularity metrics.
///
/// The serialized form is the document persisted by the paper store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Paper {
    /// arXiv identifier (e.g. `2401.12345`), the store key
    pub paper_id: Option<String>,
    pub title: String,
    /// Authors in listing order
    #[serde(default)]
    pub authors: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    /// Category tags, first appearance order, no duplicates
    #[serde(default)]
    pub categories: Vec<String>,
    pub pdf_link: Option<String>,
    pub abstract_link: Option<String>,
    /// DOI, when arXiv knows one
    pub cross_ref_id: Option<String>,
    pub citations: Option<u32>,
    pub mentions: Option<u32>,
    /// Set by the store on every write
    pub last_store_update: Option<DateTime<Utc>>,
}

impl Paper {
    /// The store key, if the record has a usable one.
    pub fn key(&self) -> Option<&str> {
        self.paper_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// True when both metrics are populated.
    pub fn has_metrics(&self) -> bool {
        self.citations.is_some() && self.mentions.is_some()
    }

    /// Add a category unless it is already present.
    pub fn add_category(&mut self, term: &str) {
        let term = term.trim();
        if !term.is_empty() && !self.categories.iter().any(|c| c == term) {
            self.categories.push(term.to_string());
        }
    }
}
