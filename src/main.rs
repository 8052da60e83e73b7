//! rustarxiv - arXiv Literature Pipeline
//!
//! Collects recent arXiv papers for a keyword list, enriches them with
//! citation and mention counts, keeps them in a local store and renders an
//! interactive HTML report.
//!
//! ## Usage
//!
//! ```bash
//! rustarxiv collect --keywords tags.txt --max 20
//! rustarxiv render --output arxiv_papers.html
//! rustarxiv top --by citations -n 5
//! ```

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rustarxiv::arxiv::{ArxivClient, QueryOptions};
use rustarxiv::config::{self, Settings};
use rustarxiv::cookies::CookieJar;
use rustarxiv::enrich::Enricher;
use rustarxiv::gscholar::CitationClient;
use rustarxiv::mentions::{MentionSource, TwitterClient};
use rustarxiv::pipeline::{self, CollectRequest};
use rustarxiv::report::{self, ReportOptions};
use rustarxiv::store::{PaperStore, SearchField, SqliteBackend};
use rustarxiv::{export, Paper};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Upper bound for day-count flags (about 100 years)
const MAX_DAYS: i64 = 36_500;

/// arXiv Literature Pipeline
#[derive(Parser)]
#[command(name = "rustarxiv")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Paper database file
    #[arg(long, global = true, env = "RUSTARXIV_DB")]
    db: Option<PathBuf>,

    /// Directory for per-run output files
    #[arg(long, global = true, env = "RUSTARXIV_RESULTS_DIR", default_value = config::DEFAULT_RESULTS_DIR)]
    results_dir: PathBuf,

    /// Proxy URL (e.g., http://127.0.0.1:7890)
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    timeout_secs: u64,

    /// Days during which stored metrics are kept as-is
    #[arg(long, global = true, default_value = "7", value_parser = clap::value_parser!(i64).range(0..=MAX_DAYS))]
    freshness_days: i64,

    /// Twitter API bearer token (mentions are estimated without it)
    #[arg(long, global = true, env = "TWITTER_BEARER_TOKEN", hide_env_values = true)]
    twitter_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search arXiv, enrich the results and store them
    Collect {
        /// Keyword file, one keyword per line
        #[arg(short, long, default_value = "tags.txt")]
        keywords: PathBuf,

        /// Maximum number of papers to fetch
        #[arg(long, default_value = "10")]
        max: u32,

        /// Lookback window in months
        #[arg(long, default_value = "3")]
        months: u32,

        /// Keep previously stored papers instead of starting fresh
        #[arg(long)]
        keep_existing: bool,
    },

    /// Re-enrich stored papers with stale or missing metrics
    Refresh {
        /// Age in days after which metrics are refreshed
        #[arg(long, default_value = "7", value_parser = clap::value_parser!(i64).range(0..=MAX_DAYS))]
        staleness_days: i64,
    },

    /// Render the stored papers as an HTML report
    Render {
        /// Output file
        #[arg(short, long, default_value = "arxiv_papers.html")]
        output: PathBuf,

        /// Page title
        #[arg(long, default_value = report::DEFAULT_TITLE)]
        title: String,

        /// Do not open the report in a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Show the most cited or most mentioned stored papers
    Top {
        /// Ranking metric
        #[arg(long, value_enum, default_value_t = RankBy::Citations)]
        by: RankBy,

        /// Number of papers
        #[arg(short, default_value = "10")]
        n: usize,
    },

    /// Case-insensitive keyword search over stored papers
    Search {
        /// Keyword
        keyword: String,

        /// Fields to search (title, abstract, authors)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<SearchField>,
    },

    /// List stored papers published in a date range
    Range {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
    },

    /// Manage Google Scholar cookies
    Cookies {
        #[command(subcommand)]
        action: CookieAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RankBy {
    Citations,
    Mentions,
}

#[derive(Subcommand)]
enum CookieAction {
    /// Clear stored cookies
    Clear,
    /// Show cookie file path
    Path,
    /// Import cookies from a JSON export file
    Import {
        /// JSON file: [{"name":"NID","value":"xxx","domain":".google.com"},...]
        file: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let settings = settings_from_cli(&cli);

    match cli.command {
        Commands::Collect {
            keywords,
            max,
            months,
            keep_existing,
        } => {
            let request = CollectRequest {
                keywords: pipeline::read_keywords(&keywords)
                    .with_context(|| format!("Failed to read keywords from {}", keywords.display()))?,
                query: QueryOptions {
                    max_results: max,
                    months_back: months,
                },
                keep_existing,
            };
            run_collect(&settings, request).await
        }
        Commands::Refresh { staleness_days } => run_refresh(&settings, staleness_days).await,
        Commands::Render {
            output,
            title,
            no_browser,
        } => run_render(&settings, output, title, no_browser),
        Commands::Top { by, n } => {
            let store = open_store(&settings)?;
            let papers = match by {
                RankBy::Citations => store.top_by_citations(n)?,
                RankBy::Mentions => store.top_by_mentions(n)?,
            };
            print_papers(&papers);
            store.close()?;
            Ok(())
        }
        Commands::Search { keyword, fields } => {
            let store = open_store(&settings)?;
            let papers = store.search(&keyword, &fields)?;
            println!("{} papers match \"{}\"", papers.len(), keyword);
            print_papers(&papers);
            store.close()?;
            Ok(())
        }
        Commands::Range { from, to } => {
            if from > to {
                bail!("--from ({}) is after --to ({})", from, to);
            }
            let start = Utc.from_utc_datetime(&from.and_time(NaiveTime::MIN));
            let end = Utc.from_utc_datetime(&to.and_hms_opt(23, 59, 59).context("Invalid --to date")?);
            let store = open_store(&settings)?;
            let papers = store.by_date_range(start, end)?;
            println!("{} papers published {} to {}", papers.len(), from, to);
            print_papers(&papers);
            store.close()?;
            Ok(())
        }
        Commands::Cookies { action } => handle_cookies(action),
    }
}

fn settings_from_cli(cli: &Cli) -> Settings {
    let mut settings = Settings::default().with_timeout_secs(cli.timeout_secs);
    if let Some(db) = &cli.db {
        settings.db_path = db.clone();
    }
    settings.results_dir = cli.results_dir.clone();
    settings.freshness_days = cli.freshness_days;
    settings.http.proxy = cli.proxy.clone();
    settings.twitter_token = cli.twitter_token.clone().filter(|t| !t.trim().is_empty());
    settings
}

fn open_store(settings: &Settings) -> Result<PaperStore<SqliteBackend>> {
    let backend = SqliteBackend::open(&settings.db_path)
        .with_context(|| format!("Failed to open database {}", settings.db_path.display()))?;
    Ok(PaperStore::new(backend).with_freshness_days(settings.freshness_days))
}

fn build_enricher(settings: &Settings) -> Result<Enricher> {
    let cookies = match CookieJar::in_home() {
        Ok(jar) => jar.load(),
        Err(e) => {
            warn!(error = %e, "Cookie jar unavailable, querying Scholar without cookies");
            Vec::new()
        }
    };
    let citations = CitationClient::new(&settings.http, &cookies)
        .context("Failed to create Google Scholar client")?
        .with_base_url(settings.scholar_url.as_str());

    let mentions = match &settings.twitter_token {
        Some(token) => {
            info!("Using Twitter API for mention counts");
            MentionSource::Twitter(
                TwitterClient::new(&settings.http, token.as_str()).context("Failed to create Twitter client")?,
            )
        }
        None => MentionSource::Estimated,
    };

    Ok(Enricher::new(citations, mentions).with_delay(settings.enrich_delay))
}

// ============================================================================
// Commands
// ============================================================================

async fn run_collect(settings: &Settings, request: CollectRequest) -> Result<()> {
    let arxiv = ArxivClient::new(&settings.http)
        .context("Failed to create arXiv client")?
        .with_base_url(settings.arxiv_url.as_str());
    let enricher = build_enricher(settings)?;
    let store = open_store(settings)?;

    println!("\n--- Stage 1: arXiv Search ---");
    println!("Keywords: {}", request.keywords.join(", "));
    println!(
        "Fetching up to {} papers from the last {} months...",
        request.query.max_results, request.query.months_back
    );

    let report = pipeline::collect(&arxiv, &enricher, &store, &request)
        .await
        .context("Collection failed")?;

    println!("\n--- Stage 2: Store ---");
    if report.cleared > 0 {
        println!("Cleared {} previously stored papers.", report.cleared);
    }
    println!(
        "Stored {} / {} papers ({} total in store).",
        report.accepted,
        report.papers.len(),
        store.count()?
    );

    let outputs = export::write_run_outputs(&settings.results_dir, &report.papers, Local::now())
        .context("Failed to write run outputs")?;
    println!("\nResults saved:");
    println!("  Text: {}", outputs.text.display());
    println!("  JSON: {}", outputs.json.display());
    println!("  CSV:  {}", outputs.csv.display());

    store.close()?;
    Ok(())
}

async fn run_refresh(settings: &Settings, staleness_days: i64) -> Result<()> {
    let enricher = build_enricher(settings)?;
    let store = open_store(settings)?;

    let refreshed = pipeline::refresh(&enricher, &store, staleness_days)
        .await
        .context("Refresh failed")?;
    println!("Refreshed metrics for {} papers.", refreshed);

    store.close()?;
    Ok(())
}

fn run_render(settings: &Settings, output: PathBuf, title: String, no_browser: bool) -> Result<()> {
    let store = open_store(settings)?;
    let papers = store.all()?;
    store.close()?;

    if papers.is_empty() {
        bail!(
            "No papers in {}. Run `rustarxiv collect` first.",
            settings.db_path.display()
        );
    }

    let html = report::render_html(&papers, &ReportOptions { title }, Local::now())
        .context("Failed to render report")?;
    let path = report::write_report(&output, &html)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Report with {} papers written to {}", papers.len(), path.display());

    if !no_browser {
        report::open_in_browser(&path).context("Failed to open browser")?;
    }
    Ok(())
}

fn print_papers(papers: &[Paper]) {
    for (i, p) in papers.iter().enumerate() {
        let date = p
            .published
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!(
            "{:>3}. [{}] {} ({})",
            i + 1,
            p.paper_id.as_deref().unwrap_or("N/A"),
            p.title,
            date
        );
        println!(
            "     citations: {}  mentions: {}",
            p.citations.map_or_else(|| "N/A".to_string(), |c| c.to_string()),
            p.mentions.map_or_else(|| "N/A".to_string(), |m| m.to_string()),
        );
    }
}

fn handle_cookies(action: CookieAction) -> Result<()> {
    let jar = CookieJar::in_home()?;

    match action {
        CookieAction::Clear => {
            if jar.clear()? {
                println!("Cookies cleared.");
            } else {
                println!("No cookies stored.");
            }
        }
        CookieAction::Path => {
            println!("Cookie file: {:?}", jar.path());
        }
        CookieAction::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let count = jar
                .import(&json)
                .context("Failed to import cookies; expected a non-empty JSON array")?;
            println!("Saved {} cookies to {:?}", count, jar.path());
        }
    }

    Ok(())
}
