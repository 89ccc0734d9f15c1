//! Newspaper source registry.
//!
//! Every newspaper we scrape is described by a [`SourceDescriptor`]: where it
//! lives, which seed pages to start from for each [`Category`], and three
//! ordered selector chains used to find article containers, headline links,
//! and body paragraphs.
//!
//! The registry is loaded once at startup, either from the built-in
//! `sources.yaml` or from a user-supplied file with the same shape, and is
//! validated before any network activity. A descriptor with an empty chain,
//! an empty seed list, an unparsable URL, or a selector that does not compile
//! makes the whole registry fail to load.
//!
//! ```yaml
//! sources:
//!   - id: cnn
//!     name: CNN
//!     base_url: https://edition.cnn.com/
//!     categories:
//!       Business: [https://edition.cnn.com/business]
//!     article_selectors: [div.card, article]
//!     title_selectors: [h3 a]
//!     content_selectors: [div.article__content p]
//! ```

use crate::error::{NewsError, Result};
use crate::models::Category;
use scraper::Selector;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

const BUILTIN_SOURCES: &str = include_str!("sources.yaml");

#[derive(Debug, Deserialize)]
struct RegistryFile {
    sources: Vec<SourceConfig>,
}

/// A descriptor as written in YAML, before validation.
#[derive(Debug, Deserialize)]
struct SourceConfig {
    id: String,
    name: String,
    base_url: String,
    categories: BTreeMap<Category, Vec<String>>,
    article_selectors: Vec<String>,
    title_selectors: Vec<String>,
    content_selectors: Vec<String>,
}

/// One compiled entry of a selector chain.
#[derive(Debug, Clone)]
pub struct Matcher {
    raw: String,
    selector: Selector,
}

impl Matcher {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// An ordered, non-empty list of selectors tried first-match-wins.
#[derive(Debug, Clone)]
pub struct SelectorChain(Vec<Matcher>);

impl SelectorChain {
    fn compile(source_id: &str, chain: &'static str, raw: &[String]) -> Result<Self> {
        if raw.is_empty() {
            return Err(NewsError::Config(format!(
                "source `{source_id}` has an empty {chain} selector chain"
            )));
        }
        raw.iter()
            .map(|s| {
                Selector::parse(s)
                    .map(|selector| Matcher {
                        raw: s.clone(),
                        selector,
                    })
                    .map_err(|e| NewsError::Selector {
                        source_id: source_id.to_string(),
                        chain,
                        selector: s.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()
            .map(SelectorChain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Matcher> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A validated newspaper descriptor.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    /// Short identifier, also used as the per-source export file stem.
    pub id: String,
    /// Display name written into every article record.
    pub name: String,
    /// Base URL that relative links are resolved against.
    pub base_url: Url,
    /// Seed pages per category, in category order. A source may list a
    /// subset of the categories; unlisted ones are not scraped.
    pub categories: BTreeMap<Category, Vec<String>>,
    pub article_selectors: SelectorChain,
    pub title_selectors: SelectorChain,
    pub content_selectors: SelectorChain,
}

impl SourceDescriptor {
    fn from_config(config: SourceConfig) -> Result<Self> {
        let id = config.id.trim().to_string();
        if id.is_empty() {
            return Err(NewsError::Config("source with an empty id".to_string()));
        }
        if config.name.trim().is_empty() {
            return Err(NewsError::Config(format!("source `{id}` has an empty name")));
        }

        let base_url = parse_http_url(&config.base_url).ok_or_else(|| {
            NewsError::Config(format!(
                "source `{id}` has an invalid base_url `{}`",
                config.base_url
            ))
        })?;

        if config.categories.is_empty() {
            return Err(NewsError::Config(format!("source `{id}` lists no categories")));
        }
        for (category, seeds) in &config.categories {
            if seeds.is_empty() {
                return Err(NewsError::Config(format!(
                    "source `{id}` has no seed addresses for {category}"
                )));
            }
            if let Some(bad) = seeds.iter().find(|s| parse_http_url(s).is_none()) {
                return Err(NewsError::Config(format!(
                    "source `{id}` has an invalid seed address `{bad}` for {category}"
                )));
            }
        }

        Ok(SourceDescriptor {
            article_selectors: SelectorChain::compile(&id, "article", &config.article_selectors)?,
            title_selectors: SelectorChain::compile(&id, "title", &config.title_selectors)?,
            content_selectors: SelectorChain::compile(&id, "content", &config.content_selectors)?,
            name: config.name,
            base_url,
            categories: config.categories,
            id,
        })
    }
}

fn parse_http_url(s: &str) -> Option<Url> {
    Url::parse(s)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

/// The immutable set of sources for one process.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    /// Load the descriptors compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_SOURCES)
    }

    /// Load descriptors from a YAML file on disk.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NewsError::io(path, e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml::from_str(yaml)?;
        if file.sources.is_empty() {
            return Err(NewsError::Config("registry lists no sources".to_string()));
        }

        let mut seen = HashSet::new();
        let sources = file
            .sources
            .into_iter()
            .map(|config| {
                let descriptor = SourceDescriptor::from_config(config)?;
                if !seen.insert(descriptor.id.clone()) {
                    return Err(NewsError::Config(format!(
                        "duplicate source id `{}`",
                        descriptor.id
                    )));
                }
                Ok(descriptor)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(count = sources.len(), "Loaded source registry");
        Ok(SourceRegistry { sources })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }
}
