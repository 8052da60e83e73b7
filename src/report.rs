//! Static HTML report.
//!
//! The page embeds the papers as JSON and sorts/expands them client-side, so
//! it works from a plain `file://` URL.

use crate::error::{ArxivError, Result};
use crate::paper::Paper;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default report title
pub const DEFAULT_TITLE: &str = "ArXiv Papers";

/// Rendering options
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Row data consumed by the page script
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    paper_id: &'a str,
    title: &'a str,
    authors: &'a [String],
    published: String,
    citations: u32,
    mentions: u32,
    paper_link: String,
    categories: &'a [String],
    #[serde(rename = "abstract")]
    abstract_text: &'a str,
}

impl<'a> From<&'a Paper> for ReportRow<'a> {
    fn from(p: &'a Paper) -> Self {
        let paper_id = p.paper_id.as_deref().unwrap_or_default();
        Self {
            paper_id,
            title: if p.title.is_empty() { "Untitled Paper" } else { p.title.as_str() },
            authors: &p.authors,
            published: p.published.map(|d| d.to_rfc3339()).unwrap_or_default(),
            citations: p.citations.unwrap_or(0),
            mentions: p.mentions.unwrap_or(0),
            paper_link: p
                .abstract_link
                .clone()
                .unwrap_or_else(|| format!("https://arxiv.org/abs/{}", paper_id)),
            categories: &p.categories,
            abstract_text: &p.abstract_text,
        }
    }
}

/// Escape text for an HTML text node or attribute value.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize rows for a `<script>` block; `<` is escaped so no value can
/// close the element early.
fn script_json(papers: &[Paper]) -> Result<String> {
    let rows: Vec<ReportRow<'_>> = papers.iter().map(ReportRow::from).collect();
    Ok(serde_json::to_string(&rows)?.replace('<', "\\u003c"))
}

/// Render the full HTML document.
pub fn render_html(papers: &[Paper], options: &ReportOptions, generated_at: DateTime<Local>) -> Result<String> {
    let title = escape_html(&options.title);
    let data = script_json(papers)?;

    Ok(PAGE_TEMPLATE
        .replace("{{TITLE}}", &title)
        .replace("{{GENERATED}}", &generated_at.format("%Y-%m-%d %H:%M:%S").to_string())
        .replace("{{COUNT}}", &papers.len().to_string())
        .replace("{{PAPERS_JSON}}", &data))
}

/// Write a rendered report, returning its absolute path.
pub fn write_report(path: &Path, html: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    let absolute = std::fs::canonicalize(path)?;
    info!(path = %absolute.display(), "HTML report generated");
    Ok(absolute)
}

/// Open a report in the default browser.
pub fn open_in_browser(path: &Path) -> Result<()> {
    open::that(path).map_err(|e| {
        ArxivError::Io(std::io::Error::new(
            e.kind(),
            format!("could not open {} in a browser: {}", path.display(), e),
        ))
    })
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{TITLE}}</title>
    <style>
        body { font-family: "Verdana", sans-serif; margin: 0; padding: 0; background-color: #eee; color: #222; }
        .container { max-width: 950px; margin: 0 auto; padding: 20px; background-color: #fff; }
        .header { background-color: #cee3f8; border-bottom: 1px solid #5f99cf; padding: 10px 20px; margin-bottom: 20px; }
        .header h1 { margin: 0; font-size: 20px; color: #369; }
        .filter-options { display: flex; justify-content: space-between; margin-bottom: 20px; padding: 10px; background-color: #f8f8f8; border: 1px solid #ddd; }
        .left-options { display: flex; gap: 10px; }
        .filter-options button { color: #369; padding: 5px 10px; background: none; border: none; cursor: pointer; font-family: inherit; font-size: inherit; }
        .filter-options button:hover { text-decoration: underline; }
        .filter-options button.active { font-weight: bold; background-color: #e2e2e2; border-radius: 3px; }
        .paper-row { padding: 10px; border-bottom: 1px solid #ddd; line-height: 1.4; }
        .paper-row:hover { background-color: #f8f8f8; }
        .paper-main { display: flex; align-items: center; cursor: pointer; }
        .rank { flex: 0 0 30px; color: #888; text-align: right; padding-right: 10px; }
        .votes { flex: 0 0 60px; text-align: center; color: #888; display: flex; flex-direction: column; }
        .votes strong { color: #ff4500; font-size: 16px; }
        .paper-content { flex: 1; }
        .paper-headline { display: flex; justify-content: space-between; align-items: baseline; }
        .paper-title { color: #00e; text-decoration: none; font-size: 16px; }
        .paper-title:hover { text-decoration: underline; }
        .paper-meta { font-size: 12px; color: #888; }
        .stats { font-size: 12px; color: #888; white-space: nowrap; margin-left: 10px; }
        .stats span { margin-left: 8px; }
        .categories { font-style: italic; }
        .paper-details { display: none; margin: 10px 0 0 100px; font-size: 13px; }
        .paper-details.show { display: block; }
        .abstract { margin-top: 5px; }
        .collapse-icon { margin-left: 5px; font-size: 14px; display: inline-block; transition: transform 0.3s; }
        .collapsed .collapse-icon { transform: rotate(180deg); }
        .footer { text-align: center; margin-top: 20px; font-size: 12px; color: #888; padding: 10px; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{{TITLE}}</h1>
        </div>
        <div class="filter-options">
            <div class="left-options">
                <button onclick="sortPapers('date')" class="active" id="sort-date">Recent</button>
                <button onclick="sortPapers('citations')" id="sort-citations">Most Cited</button>
                <button onclick="sortPapers('mentions')" id="sort-mentions">Most Mentioned</button>
            </div>
            <div class="collapse-options">
                <button onclick="expandAll()" id="expand-all">Expand All</button>
                <button onclick="collapseAll()" id="collapse-all">Collapse All</button>
            </div>
        </div>
        <div id="papers-container"></div>
        <div class="footer">
            Generated on {{GENERATED}} | Data from arXiv.org, Google Scholar, and Twitter
            <br>
            Report contains {{COUNT}} papers.
        </div>
    </div>
    <script id="papers-data" type="application/json">{{PAPERS_JSON}}</script>
    <script>
    const papers = JSON.parse(document.getElementById('papers-data').textContent);

    function escapeHtml(value) {
        return String(value == null ? '' : value)
            .replace(/&/g, '&amp;')
            .replace(/</g, '&lt;')
            .replace(/>/g, '&gt;')
            .replace(/"/g, '&quot;')
            .replace(/'/g, '&#39;');
    }

    function formatDate(dateString) {
        if (!dateString) return 'Unknown date';
        const match = dateString.match(/(\d{4}-\d{2}-\d{2})/);
        return match ? match[1] : 'Unknown date';
    }

    function formatAuthors(authors, compact) {
        if (!authors || authors.length === 0) return 'Unknown authors';
        if (compact && authors.length > 3) return authors.slice(0, 3).join(', ') + ' et al.';
        return authors.join(', ');
    }

    function toggleDetails(index) {
        const details = document.getElementById('paper-details-' + index);
        const row = document.getElementById('paper-row-' + index);
        const show = !details.classList.contains('show');
        details.classList.toggle('show', show);
        row.classList.toggle('collapsed', !show);
    }

    function setAll(show) {
        document.querySelectorAll('.paper-details').forEach(el => el.classList.toggle('show', show));
        document.querySelectorAll('.paper-row').forEach(el => el.classList.toggle('collapsed', !show));
    }

    function expandAll() { setAll(true); }
    function collapseAll() { setAll(false); }

    function sortPapers(method) {
        ['date', 'citations', 'mentions'].forEach(m =>
            document.getElementById('sort-' + m).classList.toggle('active', m === method));

        const sorted = [...papers];
        if (method === 'date') {
            sorted.sort((a, b) => (b.published || '').localeCompare(a.published || ''));
        } else if (method === 'citations') {
            sorted.sort((a, b) => (b.citations || 0) - (a.citations || 0));
        } else if (method === 'mentions') {
            sorted.sort((a, b) => (b.mentions || 0) - (a.mentions || 0));
        }

        document.getElementById('papers-container').innerHTML = sorted.map((paper, index) => `
            <div class="paper-row collapsed" id="paper-row-${index}" data-paper-id="${escapeHtml(paper.paper_id)}">
                <div class="paper-main" onclick="toggleDetails(${index})">
                    <div class="rank">${index + 1}</div>
                    <div class="votes"><strong>${paper.citations}</strong><span>cites</span></div>
                    <div class="paper-content">
                        <div class="paper-headline">
                            <a href="${escapeHtml(paper.paper_link)}" class="paper-title" target="_blank" onclick="event.stopPropagation()">${escapeHtml(paper.title)}</a>
                            <div class="stats">
                                <span class="categories">${escapeHtml(paper.categories.slice(0, 3).join(', '))}</span>
                                <span class="mention-count">${paper.mentions} mentions</span>
                                <span class="collapse-icon">&#9660;</span>
                            </div>
                        </div>
                        <div class="paper-meta">
                            submitted on ${formatDate(paper.published)} by ${escapeHtml(formatAuthors(paper.authors, true))}
                        </div>
                    </div>
                </div>
                <div class="paper-details" id="paper-details-${index}">
                    <div class="authors"><strong>Authors:</strong> ${escapeHtml(formatAuthors(paper.authors, false))}</div>
                    <div class="abstract"><strong>Abstract:</strong> ${escapeHtml(paper.abstract || 'No abstract available')}</div>
                </div>
            </div>`).join('');
    }

    document.addEventListener('DOMContentLoaded', () => sortPapers('date'));
    </script>
</body>
</html>
"#;
