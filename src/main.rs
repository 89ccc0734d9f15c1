//! # News Clusters
//!
//! Scrapes category pages of several newspapers, extracts readable article
//! text despite inconsistent markup, and groups the articles into topic
//! clusters for a display layer to read.
//!
//! ## Features
//!
//! - Sources are described in a YAML registry (built in, or `--sources`):
//!   seed pages per category plus ordered container, title, and body
//!   selector chains
//! - Link and body extraction fall back through generic strategies when a
//!   site's selectors miss
//! - TF-IDF over unigrams and bigrams, elbow-selected k, seeded k-means
//! - Per-source and combined CSV exports plus a JSON cluster export
//!
//! ## Usage
//!
//! ```sh
//! news_clusters scrape
//! news_clusters cluster
//! news_clusters run
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Indexing**: Discover article links on each source's seed pages
//! 2. **Fetching**: Download each article and extract its body text
//! 3. **Clustering**: Vectorize, choose k, partition, derive keywords
//! 4. **Output**: Write CSV files and the cluster export

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod clustering;
mod config;
mod error;
mod models;
mod outputs;
mod registry;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use clustering::cluster_articles;
use config::RunContext;
use error::{NewsError, Result};
use models::Article;
use outputs::flat::{COMBINED_FILE, read_articles, write_flat_exports};
use outputs::json::{ClusterExport, write_cluster_export};
use registry::SourceRegistry;
use scrapers::fetch::HttpFetcher;
use scrapers::pipeline::{IngestionReport, ingest_all};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("news_clusters starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Err(e) = run(&args).await {
        error!(error = %e, "Run failed");
        return Err(e.into());
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "news_clusters finished"
    );
    Ok(())
}

async fn run(args: &Cli) -> Result<()> {
    let ctx = RunContext::new(args.run_config());

    match &args.command {
        Command::Scrape(_) => {
            let registry = load_registry(args).await?;
            ensure_writable_dir(&args.data_dir).await?;
            scrape(&registry, &ctx, &args.data_dir).await?;
        }
        Command::Cluster(_) => {
            ensure_output_parent(&args.cluster_output).await?;
            let articles = read_articles(&args.data_dir.join(COMBINED_FILE), ctx.run_date).await?;
            cluster_and_export(articles, &ctx, &args.cluster_output).await?;
        }
        Command::Run { .. } => {
            let registry = load_registry(args).await?;
            ensure_writable_dir(&args.data_dir).await?;
            ensure_output_parent(&args.cluster_output).await?;
            let report = scrape(&registry, &ctx, &args.data_dir).await?;
            cluster_and_export(report.into_articles(), &ctx, &args.cluster_output).await?;
        }
    }

    Ok(())
}

/// Load and validate the registry before any network activity.
async fn load_registry(args: &Cli) -> Result<SourceRegistry> {
    let registry = match &args.sources {
        Some(path) => SourceRegistry::load(path).await?,
        None => SourceRegistry::builtin()?,
    };
    info!(sources = registry.len(), "Loaded source registry");
    Ok(registry)
}

async fn ensure_output_parent(path: &Path) -> Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => ensure_writable_dir(parent).await,
        None => Ok(()),
    }
}

async fn scrape(
    registry: &SourceRegistry,
    ctx: &RunContext,
    data_dir: &Path,
) -> Result<IngestionReport> {
    let fetcher = HttpFetcher::new(ctx.config.fetch_timeout)
        .map_err(|e| NewsError::Config(format!("failed to build HTTP client: {e}")))?;

    let report = ingest_all(&fetcher, registry, ctx).await;
    write_flat_exports(&report, data_dir).await?;
    Ok(report)
}

async fn cluster_and_export(articles: Vec<Article>, ctx: &RunContext, output: &Path) -> Result<()> {
    if articles.is_empty() {
        return Err(NewsError::EmptyCorpus);
    }

    let outcome = ctx
        .span()
        .in_scope(|| cluster_articles(articles, &ctx.config.clustering));
    let export = ClusterExport::from_articles(outcome.articles);
    write_cluster_export(&export, output).await
}
