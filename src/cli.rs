//! Command-line interface definitions for News Clusters.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Paths can be provided via command-line flags or environment variables.

use crate::clustering::ClusterMode;
use crate::config::RunConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the News Clusters application.
///
/// # Examples
///
/// ```sh
/// # Scrape every source into ./news_data
/// news_clusters scrape
///
/// # Cluster an existing all_articles.csv by category
/// news_clusters cluster --mode category
///
/// # Scrape and cluster in one go with a custom registry
/// news_clusters --sources ./sources.yaml run --max-per-category 3
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory for the per-source and combined CSV files
    #[arg(short, long, env = "NEWS_DATA_DIR", default_value = "news_data", global = true)]
    pub data_dir: PathBuf,

    /// Path of the cluster export JSON
    #[arg(
        short = 'o',
        long,
        env = "NEWS_CLUSTER_OUTPUT",
        default_value = "news_data/cluster_data.json",
        global = true
    )]
    pub cluster_output: PathBuf,

    /// Optional YAML source registry replacing the built-in one
    #[arg(short, long, env = "NEWS_SOURCES", global = true)]
    pub sources: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape every source and write the flat CSV exports
    Scrape(ScrapeArgs),
    /// Cluster the combined CSV export and write the cluster export
    Cluster(ClusterArgs),
    /// Scrape, write the CSV exports, then cluster the fresh articles
    Run {
        #[command(flatten)]
        scrape: ScrapeArgs,
        #[command(flatten)]
        cluster: ClusterArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Accepted articles to collect per source and category
    #[arg(long, default_value_t = 5)]
    pub max_per_category: usize,

    /// HTTP timeout per request, in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,

    /// Shortest pause before each article fetch, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub pacing_min_ms: u64,

    /// Longest pause before each article fetch, in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub pacing_max_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ClusterArgs {
    /// How to group articles
    #[arg(long, value_enum, default_value_t = ClusterMode::Content)]
    pub mode: ClusterMode,

    /// Largest cluster count tried by the elbow search
    #[arg(long, default_value_t = 10)]
    pub max_k: usize,

    /// Random seed for k-means
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// k-means restarts per fit
    #[arg(long, default_value_t = 10)]
    pub n_init: usize,

    /// Vocabulary size cap
    #[arg(long, default_value_t = 1000)]
    pub max_features: usize,

    /// Minimum number of articles a term must appear in
    #[arg(long, default_value_t = 2)]
    pub min_df: usize,

    /// Keywords reported per cluster
    #[arg(long, default_value_t = 10)]
    pub top_keywords: usize,
}

impl ScrapeArgs {
    fn apply(&self, config: &mut RunConfig) {
        config.max_articles_per_category = self.max_per_category;
        config.fetch_timeout = Duration::from_secs(self.timeout_secs);
        config.pacing_min = Duration::from_millis(self.pacing_min_ms);
        config.pacing_max = Duration::from_millis(self.pacing_max_ms);
    }
}

impl ClusterArgs {
    fn apply(&self, config: &mut RunConfig) {
        let clustering = &mut config.clustering;
        clustering.mode = self.mode;
        clustering.max_k = self.max_k;
        clustering.seed = self.seed;
        clustering.n_init = self.n_init;
        clustering.max_features = self.max_features;
        clustering.min_df = self.min_df;
        clustering.top_keywords = self.top_keywords;
    }
}

impl Cli {
    /// The run configuration selected by the subcommand's flags.
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::default();
        match &self.command {
            Command::Scrape(scrape) => scrape.apply(&mut config),
            Command::Cluster(cluster) => cluster.apply(&mut config),
            Command::Run { scrape, cluster } => {
                scrape.apply(&mut config);
                cluster.apply(&mut config);
            }
        }
        config
    }
}
