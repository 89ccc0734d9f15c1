//! Article body extraction with fallback strategies.
//!
//! Newspaper markup changes often and differs between sections of the same
//! site, so body text is located in three stages, each tried only when the
//! previous one came up short:
//!
//! 1. **Source chain**: each body selector from the source descriptor, in
//!    order. The matched elements' text is joined with single spaces and the
//!    first selector producing more than the acceptance threshold (100
//!    characters) wins.
//! 2. **Generic containers**: the paragraphs of each `article`, `div.article`
//!    or `div.story` element, first container over the threshold wins.
//! 3. **Last resort**: the first 15 `<p>` elements anywhere on the page,
//!    returned whatever their length.

use crate::registry::SourceDescriptor;
use crate::scrapers::fetch::PageFetcher;
use crate::scrapers::links::element_text;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

static GENERIC_CONTAINERS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("article, div.article, div.story").expect("static container selector")
});
static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static paragraph selector"));

/// Thresholds for [`extract_content`].
#[derive(Debug, Clone, Copy)]
pub struct ExtractionLimits {
    /// Text must be longer than this many characters to stop the search.
    pub accept_chars: usize,
    /// How many page paragraphs the last-resort stage may concatenate.
    pub fallback_paragraphs: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            accept_chars: 100,
            fallback_paragraphs: 15,
        }
    }
}

/// Fetch an article page and extract its body text.
///
/// Returns an empty string when the page cannot be fetched.
#[instrument(level = "info", skip_all, fields(source = %source.id, %url))]
pub async fn resolve_content<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    title: &str,
    source: &SourceDescriptor,
    limits: ExtractionLimits,
) -> String {
    match fetcher.fetch(url).await {
        Ok(html) => extract_content(&html, source, limits),
        Err(e) => {
            warn!(%title, error = %e, "Failed to fetch article page");
            String::new()
        }
    }
}

/// Extract body text from an article page.
pub fn extract_content(html: &str, source: &SourceDescriptor, limits: ExtractionLimits) -> String {
    let document = Html::parse_document(html);
    let long_enough = |s: &str| s.chars().count() > limits.accept_chars;

    for matcher in source.content_selectors.iter() {
        let elements: Vec<ElementRef> = document.select(matcher.selector()).collect();
        if elements.is_empty() {
            continue;
        }
        let content = join_text(elements);
        if long_enough(&content) {
            debug!(
                selector = matcher.as_str(),
                chars = content.chars().count(),
                "Body selector accepted"
            );
            return content;
        }
    }

    for container in document.select(&GENERIC_CONTAINERS) {
        let content = join_text(container.select(&PARAGRAPH));
        if long_enough(&content) {
            debug!("Generic article container accepted");
            return content;
        }
    }

    debug!("Falling back to page paragraphs");
    join_text(document.select(&PARAGRAPH).take(limits.fallback_paragraphs))
}

fn join_text<'a>(elements: impl IntoIterator<Item = ElementRef<'a>>) -> String {
    elements
        .into_iter()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
