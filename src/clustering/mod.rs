//! Topic clustering of accepted articles.
//!
//! Articles move through explicit stages, each produced by a pure
//! transform of the previous one:
//!
//! ```text
//! Article ─► VectorizedArticle ─► ClusteredArticle ─► ExportableArticle
//!            (TF-IDF row)          (cluster id)        (cluster keywords)
//! ```
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`preprocess`] | Lowercasing, URL and punctuation stripping |
//! | [`vectorize`] | TF-IDF over unigrams and bigrams ([`stopwords`] removed) |
//! | [`elbow`] | Cluster-count selection from WCSS |
//! | [`kmeans`] | Seeded k-means with restarts |
//! | [`keywords`] | Top centroid terms per cluster |
//!
//! Corpora too small to cluster (fewer than three articles, or no term
//! shared by two articles) collapse into one cluster `0` with no keywords.

pub mod elbow;
pub mod keywords;
pub mod kmeans;
pub mod preprocess;
pub mod stopwords;
pub mod vectorize;

use crate::models::{Article, Category, ExportableArticle};
use clap::ValueEnum;
use kmeans::KMeansParams;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};
use vectorize::{FeatureRow, VectorizerSettings};

/// How articles are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ClusterMode {
    /// TF-IDF, elbow-selected k, k-means.
    #[default]
    Content,
    /// One cluster per category, numbered by first appearance.
    Category,
}

/// Clustering tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSettings {
    pub mode: ClusterMode,
    pub max_features: usize,
    pub min_df: usize,
    /// Largest candidate k for the elbow search.
    pub max_k: usize,
    pub seed: u64,
    /// k-means restarts per fit.
    pub n_init: usize,
    /// Keywords kept per cluster.
    pub top_keywords: usize,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            mode: ClusterMode::Content,
            max_features: 1000,
            min_df: 2,
            max_k: 10,
            seed: 42,
            n_init: 10,
            top_keywords: 10,
        }
    }
}

impl ClusterSettings {
    fn vectorizer(&self) -> VectorizerSettings {
        VectorizerSettings {
            max_features: self.max_features,
            min_df: self.min_df,
        }
    }
}

/// Result of partitioning: `k`, the centroids, and one cluster id per article.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterModel {
    pub k: usize,
    pub centroids: Vec<Vec<f64>>,
    pub assignments: Vec<usize>,
}

/// An article paired with its TF-IDF row.
#[derive(Debug)]
pub struct VectorizedArticle<'m> {
    pub article: Article,
    pub features: &'m FeatureRow,
}

/// An article with its cluster id.
#[derive(Debug, Clone)]
pub struct ClusteredArticle {
    pub article: Article,
    pub cluster: usize,
}

impl ClusteredArticle {
    pub fn into_exportable(self, keywords: &BTreeMap<usize, Vec<String>>) -> ExportableArticle {
        let date_scraped = self.article.date_string();
        ExportableArticle {
            title: self.article.title,
            url: self.article.url,
            newspaper: self.article.newspaper,
            category: self.article.category,
            date_scraped,
            cluster_keywords: keywords.get(&self.cluster).cloned().unwrap_or_default(),
            cluster: self.cluster,
        }
    }
}

/// Everything the exporter needs, in ingestion order.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    pub k: usize,
    pub keywords: BTreeMap<usize, Vec<String>>,
    pub articles: Vec<ExportableArticle>,
}

/// Cluster `articles` according to `settings.mode`.
#[instrument(level = "info", skip_all, fields(articles = articles.len(), mode = ?settings.mode))]
pub fn cluster_articles(articles: Vec<Article>, settings: &ClusterSettings) -> ClusterOutcome {
    let outcome = match settings.mode {
        ClusterMode::Content => cluster_by_content(articles, settings),
        ClusterMode::Category => cluster_by_category(articles),
    };
    log_cluster_statistics(&outcome);
    outcome
}

fn finish(
    clustered: Vec<ClusteredArticle>,
    k: usize,
    keywords: BTreeMap<usize, Vec<String>>,
) -> ClusterOutcome {
    let articles = clustered
        .into_iter()
        .map(|c| c.into_exportable(&keywords))
        .collect();
    ClusterOutcome {
        k,
        keywords,
        articles,
    }
}

fn single_cluster(articles: Vec<Article>) -> ClusterOutcome {
    let k = usize::from(!articles.is_empty());
    let clustered = articles
        .into_iter()
        .map(|article| ClusteredArticle { article, cluster: 0 })
        .collect();
    let keywords = (0..k).map(|c| (c, Vec::new())).collect();
    finish(clustered, k, keywords)
}

fn cluster_by_category(articles: Vec<Article>) -> ClusterOutcome {
    let mut ids: Vec<Category> = Vec::new();
    let clustered: Vec<ClusteredArticle> = articles
        .into_iter()
        .map(|article| {
            let cluster = match ids.iter().position(|c| *c == article.category) {
                Some(id) => id,
                None => {
                    ids.push(article.category);
                    ids.len() - 1
                }
            };
            ClusteredArticle { article, cluster }
        })
        .collect();
    let keywords = (0..ids.len()).map(|c| (c, Vec::new())).collect();
    finish(clustered, ids.len(), keywords)
}

fn cluster_by_content(articles: Vec<Article>, settings: &ClusterSettings) -> ClusterOutcome {
    if articles.len() < 3 {
        warn!(count = articles.len(), "Too few articles to cluster, using one cluster");
        return single_cluster(articles);
    }

    let corpus = preprocess::build_corpus(&articles);
    let Some(vectorized) = vectorize::vectorize(&corpus, settings.vectorizer()) else {
        warn!("No usable vocabulary, using one cluster");
        return single_cluster(articles);
    };
    let matrix = &vectorized.matrix;

    let k = elbow::select_cluster_count(matrix, settings.max_k, settings.seed, settings.n_init);
    let Some(fit) = kmeans::fit(matrix, &KMeansParams::new(k, settings.seed, settings.n_init)) else {
        warn!(k, "k-means could not run, using one cluster");
        return single_cluster(articles);
    };
    let model = ClusterModel {
        k,
        centroids: fit.centroids,
        assignments: fit.labels,
    };

    let staged: Vec<VectorizedArticle<'_>> = articles
        .into_iter()
        .zip(matrix.rows())
        .map(|(article, features)| VectorizedArticle { article, features })
        .collect();
    let clustered = assign(staged, &model);
    let keywords =
        keywords::cluster_keywords(Some(&model), &vectorized.vocabulary, settings.top_keywords);
    finish(clustered, model.k, keywords)
}

fn assign(staged: Vec<VectorizedArticle<'_>>, model: &ClusterModel) -> Vec<ClusteredArticle> {
    staged
        .into_iter()
        .zip(&model.assignments)
        .map(|(v, &cluster)| {
            debug!(url = %v.article.url, cluster, terms = v.features.entries().len(), "Assigned article");
            ClusteredArticle {
                article: v.article,
                cluster,
            }
        })
        .collect()
}

/// Category and newspaper counts within one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMix {
    pub categories: BTreeMap<Category, usize>,
    pub newspapers: BTreeMap<String, usize>,
}

impl ClusterMix {
    pub fn size(&self) -> usize {
        self.categories.values().sum()
    }
}

/// Per-cluster category and newspaper distributions, keyed by cluster id.
pub fn cluster_distribution(articles: &[ExportableArticle]) -> BTreeMap<usize, ClusterMix> {
    let mut by_cluster: BTreeMap<usize, ClusterMix> = BTreeMap::new();
    for article in articles {
        let mix = by_cluster.entry(article.cluster).or_default();
        *mix.categories.entry(article.category).or_insert(0) += 1;
        *mix.newspapers.entry(article.newspaper.clone()).or_insert(0) += 1;
    }
    by_cluster
}

fn format_counts<K: std::fmt::Display>(counts: &BTreeMap<K, usize>) -> String {
    counts
        .iter()
        .map(|(key, n)| format!("{key}: {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Log size, category mix, newspaper mix, and keywords of every cluster.
pub fn log_cluster_statistics(outcome: &ClusterOutcome) {
    info!(k = outcome.k, articles = outcome.articles.len(), "Clustering finished");

    for (cluster, mix) in &cluster_distribution(&outcome.articles) {
        let keywords = outcome
            .keywords
            .get(cluster)
            .map(|k| k.join(", "))
            .unwrap_or_default();
        info!(
            cluster,
            size = mix.size(),
            categories = %format_counts(&mix.categories),
            newspapers = %format_counts(&mix.newspapers),
            %keywords,
            "Cluster summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn article(newspaper: &str, category: Category, url: &str, title: &str, content: &str) -> Article {
        Article {
            newspaper: newspaper.to_string(),
            category,
            title: title.to_string(),
            url: url.to_string(),
            content: content.to_string(),
            date_scraped: NaiveDate::from_ymd_opt(2025, 5, 8).unwrap(),
        }
    }

    fn topical(n: usize) -> Vec<Article> {
        // Each article gets a unique token that falls below min_df, so rows
        // within a topic are identical.
        (0..n)
            .map(|i| {
                let (category, text) = if i < n / 2 {
                    (Category::Business, "tobacco farmers auction prices harvest")
                } else {
                    (Category::Sports, "football league match goals striker")
                };
                article(
                    "The Herald",
                    category,
                    &format!("https://www.herald.co.zw/{i}"),
                    "Weekly roundup",
                    &format!("{text} {text} unique{i}x"),
                )
            })
            .collect()
    }

    #[test]
    fn test_category_mode_groups_four_by_four_by_five() {
        let settings = ClusterSettings {
            mode: ClusterMode::Category,
            ..ClusterSettings::default()
        };
        let mut articles = Vec::new();
        for paper in ["CNN", "BBC", "The Herald", "iHarare"] {
            for category in Category::ALL {
                for i in 0..5 {
                    let url = format!("https://{paper}/{category}/{i}").replace(' ', "");
                    articles.push(article(paper, category, &url, "Title", &"x".repeat(60)));
                }
            }
        }

        // One newspaper: four groups of five.
        let cnn = cluster_articles(articles[..20].to_vec(), &settings);
        assert_eq!(cnn.k, 4);
        for cluster in 0..4 {
            assert_eq!(cnn.articles.iter().filter(|a| a.cluster == cluster).count(), 5);
        }

        let outcome = cluster_articles(articles, &settings);

        assert_eq!(outcome.k, 4);
        let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
        for a in &outcome.articles {
            *sizes.entry(a.cluster).or_insert(0) += 1;
            assert!(a.cluster_keywords.is_empty());
        }
        assert_eq!(sizes.len(), 4);
        assert!(sizes.values().all(|n| *n == 20));
        // Ids follow first appearance: CNN's categories in enum order.
        assert_eq!(outcome.articles[0].cluster, 0);
        assert_eq!(outcome.articles[5].cluster, 1);
        assert_eq!(outcome.articles[15].category, Category::Sports);
        assert_eq!(outcome.articles[15].cluster, 3);
    }

    #[test]
    fn test_distribution_counts_categories_and_newspapers() {
        let settings = ClusterSettings {
            mode: ClusterMode::Category,
            ..ClusterSettings::default()
        };
        let body = "x".repeat(60);
        let articles = vec![
            article("CNN", Category::Business, "https://a/1", "T", &body),
            article("BBC", Category::Business, "https://a/2", "T", &body),
            article("CNN", Category::Sports, "https://a/3", "T", &body),
            article("CNN", Category::Business, "https://a/4", "T", &body),
        ];
        let outcome = cluster_articles(articles, &settings);
        let mix = cluster_distribution(&outcome.articles);

        assert_eq!(mix.len(), 2);
        assert_eq!(mix[&0].size(), 3);
        assert_eq!(mix[&0].categories[&Category::Business], 3);
        assert_eq!(mix[&0].newspapers["CNN"], 2);
        assert_eq!(mix[&0].newspapers["BBC"], 1);
        assert_eq!(mix[&1].newspapers.len(), 1);
        assert_eq!(mix[&1].newspapers["CNN"], 1);
        assert_eq!(format_counts(&mix[&0].newspapers), "BBC: 1, CNN: 2");
    }

    #[test]
    fn test_small_corpus_is_one_cluster() {
        let outcome = cluster_articles(topical(2), &ClusterSettings::default());
        assert_eq!(outcome.k, 1);
        assert!(outcome.articles.iter().all(|a| a.cluster == 0));
        assert!(outcome.articles.iter().all(|a| a.cluster_keywords.is_empty()));
    }

    #[test]
    fn test_no_shared_vocabulary_is_one_cluster() {
        let articles = vec![
            article("BBC", Category::Politics, "https://a/1", "alpha", "beta gamma"),
            article("BBC", Category::Politics, "https://a/2", "delta", "epsilon zeta"),
            article("BBC", Category::Politics, "https://a/3", "theta", "iota kappa"),
        ];
        let outcome = cluster_articles(articles, &ClusterSettings::default());
        assert_eq!(outcome.k, 1);
        assert_eq!(outcome.articles.len(), 3);
    }

    #[test]
    fn test_empty_input_has_no_clusters() {
        let outcome = cluster_articles(Vec::new(), &ClusterSettings::default());
        assert_eq!(outcome.k, 0);
        assert!(outcome.articles.is_empty());
        assert!(outcome.keywords.is_empty());
    }

    #[test]
    fn test_content_mode_separates_topics() {
        let outcome = cluster_articles(topical(6), &ClusterSettings::default());
        let labels: Vec<usize> = outcome.articles.iter().map(|a| a.cluster).collect();

        assert!((2..=5).contains(&outcome.k));
        assert!(labels.iter().all(|l| *l < outcome.k));
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);

        let tobacco = &outcome.articles[0].cluster_keywords;
        assert!(tobacco.contains(&"tobacco".to_string()));
        assert!(!tobacco.iter().any(|k| k.starts_with("unique")));
    }

    #[test]
    fn test_content_mode_keeps_every_article_once_in_order() {
        let input = topical(8);
        let urls: Vec<String> = input.iter().map(|a| a.url.clone()).collect();
        let outcome = cluster_articles(input, &ClusterSettings::default());

        let out: Vec<String> = outcome.articles.iter().map(|a| a.url.clone()).collect();
        assert_eq!(out, urls);
        assert_eq!(out.iter().collect::<HashSet<_>>().len(), urls.len());

        for a in &outcome.articles {
            assert_eq!(a.cluster_keywords, outcome.keywords[&a.cluster]);
            assert_eq!(a.date_scraped, "2025-05-08");
        }
    }

    #[test]
    fn test_content_mode_is_deterministic() {
        let a = cluster_articles(topical(8), &ClusterSettings::default());
        let b = cluster_articles(topical(8), &ClusterSettings::default());
        assert_eq!(a.articles, b.articles);
    }
}
