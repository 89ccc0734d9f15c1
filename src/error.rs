//! Error taxonomy for systemic failures.
//!
//! Per-item failures during ingestion (a page that will not load, a
//! selector chain that matches nothing) never surface here: they are
//! logged and skipped where they happen. The variants below are the
//! failures that halt a run: a bad source registry, an unreadable or
//! malformed flat export, and an output path that cannot be written.

use std::path::PathBuf;

/// Failures that abort a pipeline invocation.
#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    /// The source registry is structurally invalid.
    #[error("invalid source registry: {0}")]
    Config(String),

    /// A selector in one of a source's chains does not parse.
    #[error("source `{source_id}` has an invalid {chain} selector `{selector}`: {reason}")]
    Selector {
        source_id: String,
        chain: &'static str,
        selector: String,
        reason: String,
    },

    /// The registry YAML could not be parsed.
    #[error("failed to parse source registry: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A flat article file failed validation after remediation.
    #[error("article file schema error: {0}")]
    Schema(String),

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {cause}")]
    Io {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("failed to serialize cluster export: {0}")]
    Json(#[from] serde_json::Error),

    /// Clustering was asked to export an empty article set.
    #[error("no articles available to cluster; refusing to write an empty export")]
    EmptyCorpus,
}

impl NewsError {
    pub fn io(path: impl Into<PathBuf>, cause: std::io::Error) -> Self {
        NewsError::Io {
            path: path.into(),
            cause,
        }
    }
}

pub type Result<T> = std::result::Result<T, NewsError>;
