//! Paper store: keyed upserts with a freshness-preserving merge, plus the read
//! queries used by reports and refresh passes.
//!
//! The store keeps no locks or caches of its own. Atomicity is whatever the
//! [`DocumentBackend`] provides; because a backend without compare-and-swap can
//! lose the race between "not found" and "insert", [`PaperStore::upsert`]
//! always handles a duplicate-key insert by merging into the winner and
//! replacing by key.

use crate::error::{ArxivError, Result};
use crate::paper::Paper;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use tracing::{debug, info, warn};

/// Default window during which stored metrics win over incoming ones
pub const DEFAULT_FRESHNESS_DAYS: i64 = 7;

/// Result of a single upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// The record had no identifier and was not stored
    Rejected,
}

impl UpsertOutcome {
    pub fn is_accepted(self) -> bool {
        !matches!(self, UpsertOutcome::Rejected)
    }
}

/// Result of a backend insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    Inserted,
    /// Another writer already holds the key
    DuplicateKey,
}

/// Storage engine behind a [`PaperStore`].
///
/// Documents are keyed by `paper_id`; callers only pass papers with a key.
pub trait DocumentBackend {
    fn find_one(&self, paper_id: &str) -> Result<Option<Paper>>;

    /// Insert a new document, reporting a key collision instead of failing.
    fn insert_one(&self, paper: &Paper) -> Result<InsertResult>;

    /// Replace the document stored under the paper's key.
    fn replace_one(&self, paper: &Paper) -> Result<()>;

    fn delete_all(&self) -> Result<usize>;

    fn count(&self) -> Result<usize>;

    /// Every document, in store order.
    fn scan(&self) -> Result<Vec<Paper>>;
}

/// Fields searched by [`PaperStore::search`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Abstract,
    Authors,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [SearchField::Title, SearchField::Abstract, SearchField::Authors];

    fn matches(self, paper: &Paper, needle: &str) -> bool {
        match self {
            SearchField::Title => paper.title.to_lowercase().contains(needle),
            SearchField::Abstract => paper.abstract_text.to_lowercase().contains(needle),
            SearchField::Authors => paper
                .authors
                .iter()
                .any(|a| a.to_lowercase().contains(needle)),
        }
    }
}

impl std::str::FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SearchField::Title),
            "abstract" => Ok(SearchField::Abstract),
            "authors" | "author" => Ok(SearchField::Authors),
            other => Err(format!("unknown search field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Metric {
    Citations,
    Mentions,
}

impl Metric {
    fn of(self, paper: &Paper) -> Option<u32> {
        match self {
            Metric::Citations => paper.citations,
            Metric::Mentions => paper.mentions,
        }
    }
}

/// Paper collection with upsert and query operations
pub struct PaperStore<B: DocumentBackend> {
    backend: B,
    freshness_days: i64,
}

impl<B: DocumentBackend> PaperStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            freshness_days: DEFAULT_FRESHNESS_DAYS,
        }
    }

    /// Negative values are treated as 0.
    pub fn with_freshness_days(mut self, days: i64) -> Self {
        self.freshness_days = days.max(0);
        self
    }

    /// Insert or update one paper keyed by `paper_id`.
    pub fn upsert(&self, paper: Paper) -> Result<UpsertOutcome> {
        self.upsert_at(paper, Utc::now())
    }

    fn upsert_at(&self, mut paper: Paper, now: DateTime<Utc>) -> Result<UpsertOutcome> {
        let Some(id) = paper.key().map(str::to_string) else {
            warn!(title = %paper.title, "Skipping paper with no arXiv id");
            return Ok(UpsertOutcome::Rejected);
        };
        paper.paper_id = Some(id.clone());
        paper.last_store_update = Some(now);

        if let Some(existing) = self.backend.find_one(&id)? {
            self.keep_fresh_metrics(&existing, &mut paper, now);
            self.backend.replace_one(&paper)?;
            info!(paper_id = %id, title = %paper.title, "Updated paper");
            return Ok(UpsertOutcome::Updated);
        }

        match self.backend.insert_one(&paper)? {
            InsertResult::Inserted => {
                info!(paper_id = %id, title = %paper.title, "Added new paper");
                Ok(UpsertOutcome::Inserted)
            }
            InsertResult::DuplicateKey => {
                if let Some(winner) = self.backend.find_one(&id)? {
                    self.keep_fresh_metrics(&winner, &mut paper, now);
                }
                self.backend.replace_one(&paper)?;
                warn!(paper_id = %id, "Concurrent insert detected, replaced by key");
                Ok(UpsertOutcome::Updated)
            }
        }
    }

    /// Inside the freshness window, populated stored metrics override the
    /// incoming values.
    fn keep_fresh_metrics(&self, existing: &Paper, incoming: &mut Paper, now: DateTime<Utc>) {
        let Some(updated) = existing.last_store_update else {
            return;
        };
        // A window reaching past the earliest representable time covers everything.
        if days_before(now, self.freshness_days).is_some_and(|cutoff| updated <= cutoff) {
            return;
        }
        let mut kept = false;
        if existing.citations.is_some() {
            incoming.citations = existing.citations;
            kept = true;
        }
        if existing.mentions.is_some() {
            incoming.mentions = existing.mentions;
            kept = true;
        }
        if kept {
            debug!(paper_id = ?incoming.paper_id, "Kept stored metrics inside freshness window");
        }
    }

    /// Upsert papers in order; returns how many were stored.
    pub fn upsert_batch<I>(&self, papers: I) -> Result<usize>
    where
        I: IntoIterator<Item = Paper>,
    {
        let mut accepted = 0;
        for paper in papers {
            if self.upsert(paper)?.is_accepted() {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Remove every stored paper.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.backend.delete_all()?;
        info!(removed, "Cleared paper store");
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize> {
        self.backend.count()
    }

    pub fn get(&self, paper_id: &str) -> Result<Option<Paper>> {
        self.backend.find_one(paper_id)
    }

    pub fn all(&self) -> Result<Vec<Paper>> {
        self.backend.scan()
    }

    pub fn top_by_citations(&self, n: usize) -> Result<Vec<Paper>> {
        self.top_by(Metric::Citations, n)
    }

    pub fn top_by_mentions(&self, n: usize) -> Result<Vec<Paper>> {
        self.top_by(Metric::Mentions, n)
    }

    /// Highest metric first; equal values ordered by `paper_id` ascending.
    fn top_by(&self, metric: Metric, n: usize) -> Result<Vec<Paper>> {
        let mut papers: Vec<Paper> = self
            .backend
            .scan()?
            .into_iter()
            .filter(|p| metric.of(p).is_some())
            .collect();
        papers.sort_by(|a, b| {
            metric
                .of(b)
                .cmp(&metric.of(a))
                .then_with(|| a.paper_id.cmp(&b.paper_id))
        });
        papers.truncate(n);
        Ok(papers)
    }

    /// Case-insensitive substring search. An empty field list searches all
    /// fields.
    pub fn search(&self, keyword: &str, fields: &[SearchField]) -> Result<Vec<Paper>> {
        let fields = if fields.is_empty() {
            &SearchField::ALL[..]
        } else {
            fields
        };
        let needle = keyword.to_lowercase();

        Ok(self
            .backend
            .scan()?
            .into_iter()
            .filter(|p| fields.iter().any(|f| f.matches(p, &needle)))
            .collect())
    }

    /// Papers published within `[start, end]`, newest first.
    pub fn by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Paper>> {
        let mut papers: Vec<Paper> = self
            .backend
            .scan()?
            .into_iter()
            .filter(|p| p.published.is_some_and(|d| d >= start && d <= end))
            .collect();
        papers.sort_by(|a, b| b.published.cmp(&a.published));
        Ok(papers)
    }

    /// Papers due for re-enrichment: stale, never stamped, or missing a metric.
    pub fn needing_refresh(&self, staleness_days: i64) -> Result<Vec<Paper>> {
        self.needing_refresh_at(staleness_days, Utc::now())
    }

    fn needing_refresh_at(&self, staleness_days: i64, now: DateTime<Utc>) -> Result<Vec<Paper>> {
        if staleness_days < 0 {
            return Err(ArxivError::Validation(format!(
                "staleness must be at least 0 days, got {}",
                staleness_days
            )));
        }
        // Out of range means no record is old enough; only missing metrics count.
        let cutoff = days_before(now, staleness_days);
        Ok(self
            .backend
            .scan()?
            .into_iter()
            .filter(|p| match p.last_store_update {
                Some(updated) => cutoff.is_some_and(|c| updated < c) || !p.has_metrics(),
                None => true,
            })
            .collect())
    }
}

/// `now` minus `days`, or `None` when that leaves chrono's range.
fn days_before(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|d| now.checked_sub_signed(d))
}

impl PaperStore<SqliteBackend> {
    /// Close the underlying database.
    pub fn close(self) -> Result<()> {
        self.backend.close()
    }
}

const SCHEMA_SQL: &str = r#"
create table if not exists papers
(
    paper_id          text primary key,
    last_store_update text,
    document          text not null
);
"#;

/// SQLite document backend: one JSON document per row.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| ArxivError::from(e))
    }

    fn key_of(paper: &Paper) -> Result<&str> {
        paper
            .key()
            .ok_or_else(|| ArxivError::Validation("paper has no arXiv id".to_string()))
    }

    fn stamp_of(paper: &Paper) -> Option<String> {
        paper.last_store_update.map(|d| d.to_rfc3339())
    }
}

impl DocumentBackend for SqliteBackend {
    fn find_one(&self, paper_id: &str) -> Result<Option<Paper>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "select document from papers where paper_id = ?1",
                [paper_id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn insert_one(&self, paper: &Paper) -> Result<InsertResult> {
        let key = Self::key_of(paper)?;
        let document = serde_json::to_string(paper)?;

        let inserted = self.conn.execute(
            "insert into papers (paper_id, last_store_update, document) values (?1, ?2, ?3)",
            params![key, Self::stamp_of(paper), document],
        );

        match inserted {
            Ok(_) => Ok(InsertResult::Inserted),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Ok(InsertResult::DuplicateKey)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn replace_one(&self, paper: &Paper) -> Result<()> {
        let key = Self::key_of(paper)?;
        let document = serde_json::to_string(paper)?;

        self.conn.execute(
            "insert into papers (paper_id, last_store_update, document) values (?1, ?2, ?3)
             on conflict(paper_id) do update set
                 last_store_update = excluded.last_store_update,
                 document = excluded.document",
            params![key, Self::stamp_of(paper), document],
        )?;
        Ok(())
    }

    fn delete_all(&self) -> Result<usize> {
        Ok(self.conn.execute("delete from papers", [])?)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("select count(*) from papers", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn scan(&self) -> Result<Vec<Paper>> {
        let mut stmt = self
            .conn
            .prepare("select document from papers order by rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut papers = Vec::new();
        for row in rows {
            papers.push(serde_json::from_str(&row?)?);
        }
        Ok(papers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;
    use tracing_test::traced_test;

    fn store() -> PaperStore<SqliteBackend> {
        PaperStore::new(SqliteBackend::open_in_memory().expect("in-memory db"))
    }

    fn paper(id: &str, citations: Option<u32>, mentions: Option<u32>) -> Paper {
        Paper {
            paper_id: Some(id.to_string()),
            title: format!("Paper {}", id),
            citations,
            mentions,
            ..Default::default()
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn test_rejects_missing_id() -> Result<()> {
        let store = store();
        store.upsert(paper("2401.00001", None, None))?;

        let mut no_id = paper("", Some(1), Some(1));
        assert_eq!(store.upsert(no_id.clone())?, UpsertOutcome::Rejected);
        no_id.paper_id = None;
        assert_eq!(store.upsert(no_id)?, UpsertOutcome::Rejected);
        assert_eq!(store.count()?, 1);
        Ok(())
    }

    #[test]
    fn test_insert_then_update() -> Result<()> {
        let store = store();
        assert_eq!(store.upsert(paper("2401.00001", None, None))?, UpsertOutcome::Inserted);
        assert_eq!(store.upsert(paper("2401.00001", None, None))?, UpsertOutcome::Updated);
        assert_eq!(store.count()?, 1);
        Ok(())
    }

    #[test]
    fn test_store_sets_update_timestamp() -> Result<()> {
        let store = store();
        let mut incoming = paper("2401.00001", None, None);
        incoming.last_store_update = Some(at(1));
        store.upsert_at(incoming, at(5))?;

        let stored = store.get("2401.00001")?.expect("stored");
        assert_eq!(stored.last_store_update, Some(at(5)));
        Ok(())
    }

    #[test]
    fn test_fresh_metrics_are_preserved() -> Result<()> {
        let store = store();
        store.upsert_at(paper("2401.00001", Some(10), Some(3)), at(1))?;
        store.upsert_at(paper("2401.00001", None, Some(99)), at(3))?;

        let stored = store.get("2401.00001")?.expect("stored");
        assert_eq!(stored.citations, Some(10));
        assert_eq!(stored.mentions, Some(3));
        assert_eq!(stored.last_store_update, Some(at(3)));
        Ok(())
    }

    #[test]
    fn test_stale_metrics_are_replaced() -> Result<()> {
        let store = store();
        store.upsert_at(paper("2401.00001", Some(10), Some(3)), at(1))?;
        store.upsert_at(paper("2401.00001", Some(12), None), at(20))?;

        let stored = store.get("2401.00001")?.expect("stored");
        assert_eq!(stored.citations, Some(12));
        assert_eq!(stored.mentions, None);
        Ok(())
    }

    #[test]
    fn test_empty_stored_metric_takes_incoming_value() -> Result<()> {
        let store = store();
        store.upsert_at(paper("2401.00001", None, None), at(1))?;
        store.upsert_at(paper("2401.00001", Some(7), Some(2)), at(2))?;

        let stored = store.get("2401.00001")?.expect("stored");
        assert_eq!(stored.citations, Some(7));
        assert_eq!(stored.mentions, Some(2));
        Ok(())
    }

    #[traced_test]
    #[test]
    fn test_merge_logs_only_when_metrics_are_kept() -> Result<()> {
        let store = store();
        store.upsert_at(paper("2401.00001", None, None), at(1))?;
        store.upsert_at(paper("2401.00001", Some(2), Some(3)), at(2))?;
        assert!(!logs_contain("Kept stored metrics"));

        store.upsert_at(paper("2401.00001", Some(9), Some(9)), at(3))?;
        assert!(logs_contain("Kept stored metrics"));
        assert_eq!(store.get("2401.00001")?.expect("stored").citations, Some(2));
        Ok(())
    }

    #[test]
    fn test_custom_freshness_window() -> Result<()> {
        let store = store().with_freshness_days(1);
        store.upsert_at(paper("2401.00001", Some(10), Some(3)), at(1))?;
        store.upsert_at(paper("2401.00001", Some(11), Some(4)), at(3))?;

        let stored = store.get("2401.00001")?.expect("stored");
        assert_eq!(stored.citations, Some(11));
        Ok(())
    }

    /// Backend that lets another writer win the insert race once.
    struct RacingBackend {
        inner: SqliteBackend,
        rival: Paper,
        raced: Cell<bool>,
    }

    impl DocumentBackend for RacingBackend {
        fn find_one(&self, paper_id: &str) -> Result<Option<Paper>> {
            self.inner.find_one(paper_id)
        }

        fn insert_one(&self, paper: &Paper) -> Result<InsertResult> {
            if !self.raced.replace(true) {
                self.inner.insert_one(&self.rival)?;
            }
            self.inner.insert_one(paper)
        }

        fn replace_one(&self, paper: &Paper) -> Result<()> {
            self.inner.replace_one(paper)
        }

        fn delete_all(&self) -> Result<usize> {
            self.inner.delete_all()
        }

        fn count(&self) -> Result<usize> {
            self.inner.count()
        }

        fn scan(&self) -> Result<Vec<Paper>> {
            self.inner.scan()
        }
    }

    #[test]
    fn test_insert_race_falls_back_to_replace() -> Result<()> {
        let mut rival = paper("2401.00001", Some(5), Some(1));
        rival.last_store_update = Some(at(2));
        let store = PaperStore::new(RacingBackend {
            inner: SqliteBackend::open_in_memory()?,
            rival,
            raced: Cell::new(false),
        });

        let mut incoming = paper("2401.00001", None, None);
        incoming.title = "Incoming title".to_string();
        let outcome = store.upsert_at(incoming, at(3))?;

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(store.count()?, 1);
        let stored = store.get("2401.00001")?.expect("stored");
        assert_eq!(stored.title, "Incoming title");
        assert_eq!(stored.citations, Some(5));
        assert_eq!(stored.last_store_update, Some(at(3)));
        Ok(())
    }

    #[test]
    fn test_upsert_batch_counts_accepted() -> Result<()> {
        let store = store();
        let papers = vec![
            paper("2401.00001", None, None),
            Paper::default(),
            paper("2401.00002", None, None),
            paper("2401.00001", None, None),
        ];
        assert_eq!(store.upsert_batch(papers)?, 3);
        assert_eq!(store.count()?, 2);
        Ok(())
    }

    #[test]
    fn test_clear() -> Result<()> {
        let store = store();
        store.upsert_batch(vec![paper("2401.00001", None, None), paper("2401.00002", None, None)])?;
        assert_eq!(store.clear()?, 2);
        assert_eq!(store.count()?, 0);
        Ok(())
    }

    #[test]
    fn test_top_by_citations() -> Result<()> {
        let store = store();
        store.upsert_batch(vec![
            paper("2401.00003", Some(5), Some(1)),
            paper("2401.00001", None, Some(9)),
            paper("2401.00004", Some(20), Some(1)),
            paper("2401.00002", Some(5), Some(1)),
        ])?;

        let top = store.top_by_citations(3)?;
        let ids: Vec<_> = top.iter().filter_map(|p| p.paper_id.as_deref()).collect();
        assert_eq!(ids, vec!["2401.00004", "2401.00002", "2401.00003"]);

        let top = store.top_by_citations(10)?;
        assert_eq!(top.len(), 3);
        assert!(top.iter().all(|p| p.citations.is_some()));
        Ok(())
    }

    #[test]
    fn test_top_by_mentions() -> Result<()> {
        let store = store();
        store.upsert_batch(vec![
            paper("2401.00001", Some(1), Some(9)),
            paper("2401.00002", Some(1), None),
            paper("2401.00003", Some(1), Some(30)),
        ])?;

        let top = store.top_by_mentions(1)?;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].paper_id.as_deref(), Some("2401.00003"));
        Ok(())
    }

    #[test]
    fn test_search_is_case_insensitive() -> Result<()> {
        let store = store();
        let mut a = paper("2401.00001", None, None);
        a.title = "Jailbreaking Large Language Models".to_string();
        let mut b = paper("2401.00002", None, None);
        b.abstract_text = "We study jailbreak prompts.".to_string();
        let mut c = paper("2401.00003", None, None);
        c.authors = vec!["Jane JAILBREAKER".to_string()];
        store.upsert_batch(vec![a, b, c])?;

        assert_eq!(store.search("JAILBREAK", &[])?.len(), 3);
        assert_eq!(store.search("jailbreak", &[SearchField::Title])?.len(), 1);
        assert_eq!(
            store.search("jailbreak", &[SearchField::Abstract, SearchField::Authors])?.len(),
            2
        );
        assert!(store.search("diffusion", &[])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_by_date_range_inclusive_and_sorted() -> Result<()> {
        let store = store();
        let mut papers = Vec::new();
        for (id, day) in [("2403.00001", 1), ("2403.00005", 5), ("2403.00010", 10), ("2403.00020", 20)] {
            let mut p = paper(id, None, None);
            p.published = Some(at(day));
            papers.push(p);
        }
        papers.push(paper("2403.99999", None, None));
        store.upsert_batch(papers)?;

        let found = store.by_date_range(at(5), at(10))?;
        let ids: Vec<_> = found.iter().filter_map(|p| p.paper_id.as_deref()).collect();
        assert_eq!(ids, vec!["2403.00010", "2403.00005"]);
        Ok(())
    }

    #[test]
    fn test_needing_refresh() -> Result<()> {
        let store = store();
        store.upsert_at(paper("2401.00001", Some(1), Some(1)), at(1))?;
        store.upsert_at(paper("2401.00002", Some(1), Some(1)), at(18))?;
        store.upsert_at(paper("2401.00003", Some(1), None), at(18))?;

        let due = store.needing_refresh_at(7, at(20))?;
        let ids: Vec<_> = due.iter().filter_map(|p| p.paper_id.as_deref()).collect();
        assert_eq!(ids, vec!["2401.00001", "2401.00003"]);
        Ok(())
    }

    #[test]
    fn test_needing_refresh_with_huge_staleness() -> Result<()> {
        let store = store();
        store.upsert_at(paper("2401.00001", Some(1), Some(1)), at(1))?;
        store.upsert_at(paper("2401.00002", Some(1), None), at(1))?;

        let due = store.needing_refresh(100_000_000)?;
        let ids: Vec<_> = due.iter().filter_map(|p| p.paper_id.as_deref()).collect();
        assert_eq!(ids, vec!["2401.00002"]);
        assert!(store.needing_refresh(i64::MAX)?.len() == 1);
        Ok(())
    }

    #[test]
    fn test_needing_refresh_rejects_negative_staleness() {
        assert!(matches!(store().needing_refresh(-1), Err(ArxivError::Validation(_))));
    }

    #[test]
    fn test_huge_freshness_window_keeps_metrics() -> Result<()> {
        let store = store().with_freshness_days(100_000_000);
        store.upsert(paper("2401.00001", Some(10), Some(3)))?;
        store.upsert(paper("2401.00001", Some(11), Some(4)))?;

        let stored = store.get("2401.00001")?.expect("stored");
        assert_eq!(stored.citations, Some(10));
        assert_eq!(stored.mentions, Some(3));

        let store = store.with_freshness_days(i64::MAX);
        store.upsert(paper("2401.00001", Some(12), Some(5)))?;
        assert_eq!(store.get("2401.00001")?.expect("stored").citations, Some(10));
        Ok(())
    }

    #[test]
    fn test_reopen_file_database() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("nested").join("papers.db");

        let store = PaperStore::new(SqliteBackend::open(&path)?);
        store.upsert(paper("2401.00001", Some(3), Some(4)))?;
        store.close()?;

        let store = PaperStore::new(SqliteBackend::open(&path)?);
        let stored = store.get("2401.00001")?.expect("persisted");
        assert_eq!(stored.citations, Some(3));
        Ok(())
    }

    #[test]
    fn test_parse_search_field() {
        assert_eq!("Title".parse::<SearchField>(), Ok(SearchField::Title));
        assert_eq!("authors".parse::<SearchField>(), Ok(SearchField::Authors));
        assert!("venue".parse::<SearchField>().is_err());
    }
}
