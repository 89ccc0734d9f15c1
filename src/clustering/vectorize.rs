//! TF-IDF vectorization of the preprocessed corpus.
//!
//! Tokens are runs of two or more word characters. Stopwords are removed
//! first, then unigrams and bigrams of the remaining tokens become
//! candidate terms. A term must occur in at least `min_df` documents; when
//! more terms survive than `max_features`, the ones with the highest corpus
//! frequency are kept (ties broken alphabetically). The final vocabulary is
//! sorted alphabetically and column `j` of the matrix is `vocabulary[j]`.
//!
//! Weights are raw term counts times the smoothed inverse document
//! frequency `ln((1 + n) / (1 + df)) + 1`, and each row is scaled to unit
//! L2 norm.

use crate::clustering::stopwords::is_stopword;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("static regex"));

/// Vectorizer limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorizerSettings {
    pub max_features: usize,
    pub min_df: usize,
}

impl Default for VectorizerSettings {
    fn default() -> Self {
        Self {
            max_features: 1000,
            min_df: 2,
        }
    }
}

/// One sparse document vector: `(column, weight)` pairs sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    entries: Vec<(usize, f64)>,
}

impl FeatureRow {
    pub fn new(mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|(col, _)| *col);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn squared_norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum()
    }

    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.entries.iter().map(|(col, v)| v * dense[*col]).sum()
    }

    pub fn to_dense(&self, n_features: usize) -> Vec<f64> {
        let mut dense = vec![0.0; n_features];
        for (col, v) in &self.entries {
            dense[*col] = *v;
        }
        dense
    }
}

/// One row per document over a fixed vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<FeatureRow>,
    n_features: usize,
}

impl FeatureMatrix {
    pub fn new(rows: Vec<FeatureRow>, n_features: usize) -> Self {
        Self { rows, n_features }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The matrix together with the column labels.
#[derive(Debug, Clone)]
pub struct Vectorized {
    pub matrix: FeatureMatrix,
    pub vocabulary: Vec<String>,
}

fn terms(document: &str) -> Vec<String> {
    let lowered = document.to_lowercase();
    let tokens: Vec<&str> = TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stopword(t))
        .collect();

    let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    terms.extend(tokens.windows(2).map(|w| format!("{} {}", w[0], w[1])));
    terms
}

/// Build the TF-IDF matrix for `corpus`.
///
/// Returns `None` when there are fewer than two documents or no term clears
/// the document-frequency threshold.
pub fn vectorize(corpus: &[String], settings: VectorizerSettings) -> Option<Vectorized> {
    let n_docs = corpus.len();
    if n_docs < 2 {
        warn!(documents = n_docs, "Not enough documents to vectorize");
        return None;
    }

    let counts: Vec<BTreeMap<String, usize>> = corpus
        .iter()
        .map(|doc| {
            let mut tf = BTreeMap::new();
            for term in terms(doc) {
                *tf.entry(term).or_insert(0) += 1;
            }
            tf
        })
        .collect();

    // term -> (document frequency, corpus frequency)
    let mut stats: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for tf in &counts {
        for (term, count) in tf {
            let entry = stats.entry(term.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += count;
        }
    }

    let mut kept: Vec<(&str, usize, usize)> = stats
        .into_iter()
        .filter(|(_, (df, _))| *df >= settings.min_df)
        .map(|(term, (df, total))| (term, df, total))
        .collect();
    if kept.len() > settings.max_features {
        kept.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(b.0)));
        kept.truncate(settings.max_features);
        kept.sort_by(|a, b| a.0.cmp(b.0));
    }
    if kept.is_empty() {
        warn!(documents = n_docs, "No term reached the minimum document frequency");
        return None;
    }

    let vocabulary: Vec<String> = kept.iter().map(|(term, _, _)| term.to_string()).collect();
    let column: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(j, term)| (term.as_str(), j))
        .collect();
    let idf: Vec<f64> = kept
        .iter()
        .map(|(_, df, _)| ((1.0 + n_docs as f64) / (1.0 + *df as f64)).ln() + 1.0)
        .collect();

    let rows: Vec<FeatureRow> = counts
        .iter()
        .map(|tf| {
            let mut entries: Vec<(usize, f64)> = tf
                .iter()
                .filter_map(|(term, count)| {
                    column
                        .get(term.as_str())
                        .map(|&j| (j, *count as f64 * idf[j]))
                })
                .collect();
            let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, v) in &mut entries {
                    *v /= norm;
                }
            }
            FeatureRow::new(entries)
        })
        .collect();

    info!(
        documents = n_docs,
        features = vocabulary.len(),
        "Vectorized articles"
    );
    Some(Vectorized {
        matrix: FeatureMatrix::new(rows, vocabulary.len()),
        vocabulary,
    })
}
