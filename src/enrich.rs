//! Attach citation and mention counts to fetched papers.

use crate::gscholar::CitationClient;
use crate::mentions::MentionSource;
use crate::paper::Paper;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};

/// Randomized pause between consecutive upstream lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Draw a delay uniformly from the range.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for DelayRange {
    /// 2 to 4 seconds, the pace Google Scholar tolerates.
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(4))
    }
}

/// Sequential, best-effort metric enrichment
pub struct Enricher {
    citations: CitationClient,
    mentions: MentionSource,
    delay: DelayRange,
}

impl Enricher {
    pub fn new(citations: CitationClient, mentions: MentionSource) -> Self {
        Self {
            citations,
            mentions,
            delay: DelayRange::default(),
        }
    }

    pub fn with_delay(mut self, delay: DelayRange) -> Self {
        self.delay = delay;
        self
    }

    /// Enrich every paper that has an identifier.
    ///
    /// Papers without one pass through with both metrics left empty. Lookup
    /// failures become zero counts; the batch always runs to completion.
    pub async fn enrich<I>(&self, papers: I) -> Vec<Paper>
    where
        I: IntoIterator<Item = Paper>,
    {
        let papers: Vec<Paper> = papers.into_iter().collect();
        let total = papers.len();
        info!(total, "Enriching papers with citation and mention counts");

        let mut enriched = Vec::with_capacity(total);
        let mut looked_up = 0usize;

        for (index, mut paper) in papers.into_iter().enumerate() {
            let Some(id) = paper.key().map(str::to_string) else {
                info!(position = index + 1, title = %paper.title, "No arXiv id, skipping enrichment");
                enriched.push(paper);
                continue;
            };

            if looked_up > 0 {
                let pause = self.delay.sample();
                debug!(millis = pause.as_millis() as u64, "Pausing between lookups");
                tokio::time::sleep(pause).await;
            }
            looked_up += 1;

            let citations = self.citations.citation_count(&id).await;
            let mentions = self.mentions.mentions(&id).await;
            info!(
                position = index + 1,
                total,
                paper_id = %id,
                citations,
                mentions,
                "Enriched paper"
            );

            paper.citations = Some(citations);
            paper.mentions = Some(mentions);
            enriched.push(paper);
        }

        enriched
    }
}
