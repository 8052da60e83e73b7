//! Per-run output files: text summary, JSON dump and CSV.

use crate::error::Result;
use crate::paper::Paper;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Base name of the files written for each collection run
const BASE_FILENAME: &str = "arxiv_results";

/// Paths written by [`write_run_outputs`]
#[derive(Debug, Clone)]
pub struct RunOutputs {
    pub text: PathBuf,
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Flat CSV row; list fields are joined with "; "
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    paper_id: &'a str,
    title: &'a str,
    authors: String,
    published: String,
    categories: String,
    cross_ref_id: &'a str,
    abstract_link: &'a str,
    pdf_link: &'a str,
    citations: Option<u32>,
    mentions: Option<u32>,
}

impl<'a> From<&'a Paper> for CsvRow<'a> {
    fn from(p: &'a Paper) -> Self {
        Self {
            paper_id: p.paper_id.as_deref().unwrap_or_default(),
            title: &p.title,
            authors: p.authors.join("; "),
            published: p.published.map(|d| d.to_rfc3339()).unwrap_or_default(),
            categories: p.categories.join("; "),
            cross_ref_id: p.cross_ref_id.as_deref().unwrap_or_default(),
            abstract_link: p.abstract_link.as_deref().unwrap_or_default(),
            pdf_link: p.pdf_link.as_deref().unwrap_or_default(),
            citations: p.citations,
            mentions: p.mentions,
        }
    }
}

fn display_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Human-readable summary of a batch.
pub fn text_summary(papers: &[Paper], now: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ArXiv search results - {}", now.format("%Y-%m-%d"));
    let _ = writeln!(out, "Total results: {}\n", papers.len());

    for (i, p) in papers.iter().enumerate() {
        let _ = writeln!(out, "=== Paper {} ===", i + 1);
        let _ = writeln!(out, "Title: {}", p.title);
        let _ = writeln!(out, "Authors: {}", p.authors.join(", "));
        let _ = writeln!(out, "Published: {}", display_opt(p.published.map(|d| d.to_rfc3339())));
        let _ = writeln!(out, "Categories: {}", p.categories.join(", "));
        let _ = writeln!(out, "arXiv ID: {}", display_opt(p.paper_id.as_deref()));
        let _ = writeln!(out, "DOI: {}", display_opt(p.cross_ref_id.as_deref()));
        let _ = writeln!(out, "Abstract page: {}", display_opt(p.abstract_link.as_deref()));
        let _ = writeln!(out, "PDF: {}", display_opt(p.pdf_link.as_deref()));
        let _ = writeln!(out, "Citations: {}", display_opt(p.citations));
        let _ = writeln!(out, "Twitter mentions: {}", display_opt(p.mentions));
        let _ = writeln!(out, "Abstract:\n{}\n", p.abstract_text);
    }
    out
}

/// Write the text, JSON and CSV outputs of a run into `dir`.
pub fn write_run_outputs(dir: &Path, papers: &[Paper], now: DateTime<Local>) -> Result<RunOutputs> {
    std::fs::create_dir_all(dir)?;
    let stamp = now.format("%Y%m%d_%H%M%S");
    let outputs = RunOutputs {
        text: dir.join(format!("{}_{}.txt", BASE_FILENAME, stamp)),
        json: dir.join(format!("{}_{}.json", BASE_FILENAME, stamp)),
        csv: dir.join(format!("{}_{}.csv", BASE_FILENAME, stamp)),
    };

    std::fs::write(&outputs.text, text_summary(papers, now))?;
    std::fs::write(&outputs.json, serde_json::to_string_pretty(papers)?)?;
    save_csv(&outputs.csv, papers)?;

    info!(
        text = %outputs.text.display(),
        json = %outputs.json.display(),
        csv = %outputs.csv.display(),
        "Saved run outputs"
    );
    Ok(outputs)
}

fn save_csv(path: &Path, papers: &[Paper]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    for paper in papers {
        wtr.serialize(CsvRow::from(paper))?;
    }
    wtr.flush()?;
    Ok(())
}
