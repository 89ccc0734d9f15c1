//! Article link discovery on category seed pages.
//!
//! A seed page (e.g. `https://edition.cnn.com/business`) is scanned with the
//! source's article-container chain. The first container selector that
//! matches anything wins; every container it matched is then searched for
//! headline links in two ways:
//!
//! 1. Each title selector, in order, is tried against the container. A match
//!    contributes a link if it is, contains, or sits inside an anchor.
//! 2. Every anchor in the container whose `href` looks like an article path
//!    (`/news/`, `/story/`, `/politics/`, ...) is collected too, falling back
//!    to the container's heading text when the anchor itself has no text.
//!
//! Relative URLs are resolved against the source's base URL. Links with an
//! empty title are dropped and duplicates are removed keeping the first
//! occurrence, so the output preserves discovery order.

use crate::models::{ArticleLink, Category};
use crate::registry::SourceDescriptor;
use crate::scrapers::fetch::PageFetcher;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// The links resolved from one seed page, consumed once.
pub type LinkBatch = std::vec::IntoIter<ArticleLink>;

const ARTICLE_PATH_FRAGMENTS: &[&str] = &["/news/", "/article/", "/story/"];

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static anchor selector"));
static HEADING: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3").expect("static heading selector"));

/// Fetch a seed page and resolve its article links.
///
/// Fetch failures and non-200 responses are logged and produce an empty
/// batch.
#[instrument(level = "info", skip_all, fields(source = %source.id, %seed))]
pub async fn resolve_links<F: PageFetcher>(
    fetcher: &F,
    seed: &str,
    source: &SourceDescriptor,
) -> LinkBatch {
    let html = match fetcher.fetch(seed).await {
        Ok(html) => html,
        Err(e) => {
            warn!(error = %e, "Failed to fetch seed page");
            return Vec::new().into_iter();
        }
    };

    let links = extract_links(&html, source);
    info!(count = links.len(), "Found unique article links");
    links.into_iter()
}

/// Extract ordered, deduplicated article links from a seed page's HTML.
pub fn extract_links(html: &str, source: &SourceDescriptor) -> Vec<ArticleLink> {
    let document = Html::parse_document(html);

    let Some((matcher, containers)) = source.article_selectors.iter().find_map(|m| {
        let found: Vec<ElementRef> = document.select(m.selector()).collect();
        (!found.is_empty()).then_some((m, found))
    }) else {
        debug!(source = %source.id, "No article container selector matched");
        return Vec::new();
    };
    info!(
        selector = matcher.as_str(),
        matched = containers.len(),
        "Article container selector matched"
    );

    let mut candidates = Vec::new();
    for container in &containers {
        for title_matcher in source.title_selectors.iter() {
            let Some(element) = container.select(title_matcher.selector()).next() else {
                continue;
            };
            if let Some(url) = anchor_target(element).and_then(|h| resolve(&source.base_url, h))
            {
                candidates.push(ArticleLink {
                    url,
                    title: element_text(element),
                });
            }
        }

        for anchor in container.select(&ANCHOR) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !looks_like_article(href) {
                continue;
            }
            let Some(url) = resolve(&source.base_url, href) else {
                continue;
            };
            candidates.push(ArticleLink {
                url,
                title: anchor_title(anchor, *container),
            });
        }
    }

    candidates
        .into_iter()
        .filter(|link| !link.title.is_empty())
        .unique_by(|link| link.url.clone())
        .collect()
}

/// The `href` of an element that is, contains, or sits inside an anchor.
fn anchor_target(element: ElementRef<'_>) -> Option<&str> {
    if let Some(href) = element.value().attr("href") {
        return Some(href);
    }
    if let Some(inner) = element.select(&ANCHOR).next() {
        return inner.value().attr("href");
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
}

fn anchor_title(anchor: ElementRef<'_>, container: ElementRef<'_>) -> String {
    let text = element_text(anchor);
    if !text.is_empty() {
        return text;
    }
    let title_attr = anchor.value().attr("title").map(str::trim).unwrap_or_default();
    if !title_attr.is_empty() {
        return title_attr.to_string();
    }
    container
        .select(&HEADING)
        .map(element_text)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).join(" ")
}

fn looks_like_article(href: &str) -> bool {
    ARTICLE_PATH_FRAGMENTS
        .iter()
        .chain(Category::ALL.iter().flat_map(|c| c.path_fragments()))
        .any(|fragment| href.contains(*fragment))
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }
    base.join(href)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(|u| u.to_string())
}
