//! Ingestion across every source and category.
//!
//! Sources are visited in registry order, categories in [`Category`] order,
//! and seed pages in the order listed. Everything runs sequentially: each
//! article fetch is preceded by a random pause, and nothing is fetched
//! concurrently.
//!
//! Each category has a budget of accepted articles (5 by default). Links
//! from a seed page are taken up to the remaining budget; a rejected link
//! consumes its slot for that seed page but not the budget, so later seed
//! pages can still fill the category.
//!
//! An article address is fetched at most once per source. A link that an
//! earlier seed page (of any category) already produced is skipped before
//! pacing, so it neither costs a request nor a slot.
//!
//! None of the per-item steps can fail the run: link and content resolution
//! already turn fetch errors into empty results, and short articles are
//! rejected with a warning.

use crate::config::RunContext;
use crate::models::{Article, Category};
use crate::registry::{SourceDescriptor, SourceRegistry};
use crate::scrapers::content::resolve_content;
use crate::scrapers::fetch::{PageFetcher, pause};
use crate::scrapers::links::resolve_links;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{Instrument, debug, info, instrument, warn};

/// Articles accepted from one newspaper, in discovery order.
#[derive(Debug, Clone)]
pub struct SourceArticles {
    pub source_id: String,
    pub newspaper: String,
    pub articles: Vec<Article>,
}

/// Everything accepted during one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    pub sources: Vec<SourceArticles>,
}

impl IngestionReport {
    /// All accepted articles in ingestion order (source, category, discovery).
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.sources.iter().flat_map(|s| s.articles.iter())
    }

    pub fn into_articles(self) -> Vec<Article> {
        self.sources.into_iter().flat_map(|s| s.articles).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.iter().map(|s| s.articles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scrape every source in the registry.
pub async fn ingest_all<F: PageFetcher>(
    fetcher: &F,
    registry: &SourceRegistry,
    ctx: &RunContext,
) -> IngestionReport {
    info!(sources = registry.len(), "Starting web scraping process");

    let sources: Vec<SourceArticles> = stream::iter(registry.iter())
        .then(|source| ingest_source(fetcher, source, ctx))
        .collect::<Vec<_>>()
        .instrument(ctx.span().clone())
        .await;

    let report = IngestionReport { sources };
    if report.is_empty() {
        warn!("No articles were scraped successfully");
    } else {
        info!(count = report.len(), "Scraping completed");
    }
    report
}

/// Scrape every category of one source.
#[instrument(level = "info", skip_all, fields(source = %source.id))]
pub async fn ingest_source<F: PageFetcher>(
    fetcher: &F,
    source: &SourceDescriptor,
    ctx: &RunContext,
) -> SourceArticles {
    info!(newspaper = %source.name, "Scraping newspaper");

    let mut articles = Vec::new();
    let mut seen = HashSet::new();
    for (category, seeds) in &source.categories {
        let accepted = ingest_category(fetcher, source, *category, seeds, &mut seen, ctx).await;
        articles.extend(accepted);
    }

    info!(count = articles.len(), "Finished newspaper");
    SourceArticles {
        source_id: source.id.clone(),
        newspaper: source.name.clone(),
        articles,
    }
}

#[instrument(level = "info", skip_all, fields(%category))]
async fn ingest_category<F: PageFetcher>(
    fetcher: &F,
    source: &SourceDescriptor,
    category: Category,
    seeds: &[String],
    seen: &mut HashSet<String>,
    ctx: &RunContext,
) -> Vec<Article> {
    let config = &ctx.config;
    let budget = config.max_articles_per_category;
    let mut accepted = Vec::new();

    for seed in seeds {
        if accepted.len() >= budget {
            break;
        }
        info!(%seed, "Accessing seed page");

        let remaining = budget - accepted.len();
        let links: Vec<_> = resolve_links(fetcher, seed, source)
            .await
            .filter(|link| {
                let repeat = seen.contains(&link.url);
                if repeat {
                    debug!(url = %link.url, "Article already visited, skipping");
                }
                !repeat
            })
            .take(remaining)
            .collect();
        for link in links {
            seen.insert(link.url.clone());
            pause(config.pacing_min, config.pacing_max).await;
            info!(title = %link.title, url = %link.url, "Scraping article");

            let content =
                resolve_content(fetcher, &link.url, &link.title, source, config.extraction).await;
            match Article::accept(
                &source.name,
                category,
                link,
                content,
                ctx.run_date,
                config.min_content_chars,
            ) {
                Ok(article) => {
                    info!(
                        url = %article.url,
                        preview = %truncate_for_log(&article.content, 80),
                        "Accepted article"
                    );
                    accepted.push(article);
                    if accepted.len() >= budget {
                        break;
                    }
                }
                Err(rejection) => {
                    warn!(
                        url = %rejection.link.url,
                        chars = rejection.content_chars,
                        "Article content too short, skipping"
                    );
                }
            }
        }
    }

    info!(count = accepted.len(), "Finished category");
    accepted
}
