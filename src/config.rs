//! Run configuration and the per-invocation run context.
//!
//! All tunables live in [`RunConfig`], built from the command line in
//! `main`. A [`RunContext`] pairs that configuration with the capture date
//! and a `run` tracing span, and is passed by reference to every pipeline
//! stage. It lives exactly as long as one pipeline invocation.

use crate::clustering::ClusterSettings;
use crate::scrapers::content::ExtractionLimits;
use chrono::{Local, NaiveDate};
use std::time::Duration;
use tracing::{Span, info_span};

/// Tunables for ingestion and clustering.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Per-request HTTP timeout.
    pub fetch_timeout: Duration,
    /// Lower bound of the random pause before each article fetch.
    pub pacing_min: Duration,
    /// Upper bound of the random pause before each article fetch.
    pub pacing_max: Duration,
    /// Accepted articles to collect per source and category.
    pub max_articles_per_category: usize,
    /// Articles with less body text than this are rejected.
    pub min_content_chars: usize,
    pub extraction: ExtractionLimits,
    pub clustering: ClusterSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(15),
            pacing_min: Duration::from_millis(1000),
            pacing_max: Duration::from_millis(3000),
            max_articles_per_category: 5,
            min_content_chars: 50,
            extraction: ExtractionLimits::default(),
            clustering: ClusterSettings::default(),
        }
    }
}

/// State shared by every stage of one pipeline invocation.
#[derive(Debug)]
pub struct RunContext {
    pub config: RunConfig,
    /// Date stamped on every article captured in this run.
    pub run_date: NaiveDate,
    span: Span,
}

impl RunContext {
    pub fn new(config: RunConfig) -> Self {
        Self::with_date(config, Local::now().date_naive())
    }

    pub fn with_date(config: RunConfig, run_date: NaiveDate) -> Self {
        let span = info_span!("run", date = %run_date);
        Self {
            config,
            run_date,
            span,
        }
    }

    /// The `run` span; stages instrument themselves as its children.
    pub fn span(&self) -> &Span {
        &self.span
    }
}
