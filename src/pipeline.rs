//! Collection and refresh runs: fetch → enrich → store.

use crate::arxiv::{ArxivClient, QueryOptions};
use crate::enrich::Enricher;
use crate::error::{ArxivError, Result};
use crate::paper::Paper;
use crate::store::{DocumentBackend, PaperStore};
use std::path::Path;
use tracing::{info, warn};

/// Parameters of one collection run
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub keywords: Vec<String>,
    pub query: QueryOptions,
    /// Keep previously stored papers instead of starting fresh
    pub keep_existing: bool,
}

/// What a collection run did
#[derive(Debug)]
pub struct CollectionReport {
    /// The enriched batch, in feed order
    pub papers: Vec<Paper>,
    /// Papers inserted or updated in the store
    pub accepted: usize,
    /// Papers removed before storing (fresh runs only)
    pub cleared: usize,
}

/// Read one keyword per line, skipping blank lines.
pub fn read_keywords(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let keywords: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if keywords.is_empty() {
        return Err(ArxivError::Validation(format!(
            "no keywords found in {}",
            path.display()
        )));
    }
    Ok(keywords)
}

/// Run a full collection.
///
/// # Errors
///
/// Fails when the search fails, returns nothing, or returns nothing with an
/// arXiv id. Enrichment never fails the run.
pub async fn collect<B: DocumentBackend>(
    arxiv: &ArxivClient,
    enricher: &Enricher,
    store: &PaperStore<B>,
    request: &CollectRequest,
) -> Result<CollectionReport> {
    let feed = arxiv.search(&request.keywords, &request.query).await?;
    let papers = feed.collect::<Result<Vec<Paper>>>()?;

    if papers.is_empty() {
        return Err(ArxivError::NoPapers(
            "no papers found matching the criteria".to_string(),
        ));
    }
    let identified = papers.iter().filter(|p| p.key().is_some()).count();
    if identified == 0 {
        return Err(ArxivError::NoPapers(format!(
            "none of the {} papers has an arXiv id",
            papers.len()
        )));
    }
    info!(fetched = papers.len(), identified, "Fetched papers");

    let papers = enricher.enrich(papers).await;

    let cleared = if request.keep_existing {
        0
    } else {
        store.clear()?
    };
    let accepted = store.upsert_batch(papers.iter().cloned())?;
    if accepted < papers.len() {
        warn!(rejected = papers.len() - accepted, "Some papers were not stored");
    }
    info!(accepted, keep_existing = request.keep_existing, "Stored papers");

    Ok(CollectionReport {
        papers,
        accepted,
        cleared,
    })
}

/// Re-enrich stored papers that are stale or missing a metric.
///
/// Returns the number of papers written back.
pub async fn refresh<B: DocumentBackend>(
    enricher: &Enricher,
    store: &PaperStore<B>,
    staleness_days: i64,
) -> Result<usize> {
    let due = store.needing_refresh(staleness_days)?;
    if due.is_empty() {
        info!(staleness_days, "No papers need a metrics refresh");
        return Ok(0);
    }
    info!(count = due.len(), staleness_days, "Refreshing paper metrics");

    let papers = enricher.enrich(due).await;
    store.upsert_batch(papers)
}
