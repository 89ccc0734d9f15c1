//! JSON cluster export for the display layer.
//!
//! The export is a single object keyed by cluster id as a decimal string,
//! in numeric order:
//!
//! ```json
//! {
//!   "0": [ { "title": "...", "url": "...", "newspaper": "...",
//!            "category": "...", "date_scraped": "2025-05-08",
//!            "cluster_keywords": ["...", "..."] } ],
//!   "1": [ ... ]
//! }
//! ```
//!
//! Articles keep their ingestion order inside each cluster, and every
//! article of a cluster carries the same keyword list. Serialization is
//! deterministic, so the same input always produces the same bytes.

use crate::error::{NewsError, Result};
use crate::models::ExportableArticle;
use crate::utils::write_atomic;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

/// Articles grouped by cluster id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterExport {
    clusters: BTreeMap<usize, Vec<ExportableArticle>>,
}

impl ClusterExport {
    /// Group `articles` by their cluster id, preserving their order.
    pub fn from_articles(articles: impl IntoIterator<Item = ExportableArticle>) -> Self {
        let mut clusters: BTreeMap<usize, Vec<ExportableArticle>> = BTreeMap::new();
        for article in articles {
            clusters.entry(article.cluster).or_default().push(article);
        }
        Self { clusters }
    }

    pub fn clusters(&self) -> &BTreeMap<usize, Vec<ExportableArticle>> {
        &self.clusters
    }

    pub fn article_count(&self) -> usize {
        self.clusters.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for ClusterExport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.clusters.len()))?;
        for (id, articles) in &self.clusters {
            map.serialize_entry(&id.to_string(), articles)?;
        }
        map.end()
    }
}

/// Write `export` to `path`, replacing any previous export atomically.
///
/// # Errors
///
/// [`NewsError::EmptyCorpus`] when there is nothing to export, so a failed
/// scrape never overwrites the last good export with an empty one.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_cluster_export(export: &ClusterExport, path: &Path) -> Result<()> {
    if export.is_empty() {
        return Err(NewsError::EmptyCorpus);
    }

    let json = export.to_json_string()?;
    write_atomic(path, json.as_bytes()).await?;
    info!(
        clusters = export.clusters().len(),
        articles = export.article_count(),
        "Wrote cluster export"
    );
    Ok(())
}
