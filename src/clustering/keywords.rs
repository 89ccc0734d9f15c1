//! Per-cluster keywords from centroid weights.

use crate::clustering::ClusterModel;
use std::collections::BTreeMap;

/// Top `top_n` vocabulary terms of every centroid, heaviest first.
///
/// Equal weights keep vocabulary order. Without a model the map is empty.
pub fn cluster_keywords(
    model: Option<&ClusterModel>,
    vocabulary: &[String],
    top_n: usize,
) -> BTreeMap<usize, Vec<String>> {
    let Some(model) = model else {
        return BTreeMap::new();
    };

    model
        .centroids
        .iter()
        .enumerate()
        .map(|(cluster, centroid)| {
            let mut ranked: Vec<usize> = (0..vocabulary.len().min(centroid.len())).collect();
            ranked.sort_by(|a, b| centroid[*b].total_cmp(&centroid[*a]));
            let terms = ranked
                .into_iter()
                .take(top_n)
                .map(|j| vocabulary[j].clone())
                .collect();
            (cluster, terms)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    fn model(centroids: Vec<Vec<f64>>) -> ClusterModel {
        ClusterModel {
            k: centroids.len(),
            assignments: vec![],
            centroids,
        }
    }

    #[test]
    fn test_orders_terms_by_weight() {
        let m = model(vec![vec![0.1, 0.7, 0.3], vec![0.5, 0.0, 0.2]]);
        let keywords = cluster_keywords(Some(&m), &vocab(&["budget", "election", "vote"]), 2);
        assert_eq!(keywords[&0], vec!["election", "vote"]);
        assert_eq!(keywords[&1], vec!["budget", "vote"]);
    }

    #[test]
    fn test_ties_keep_vocabulary_order() {
        let m = model(vec![vec![0.2, 0.4, 0.4, 0.2]]);
        let keywords = cluster_keywords(Some(&m), &vocab(&["a1", "b2", "c3", "d4"]), 10);
        assert_eq!(keywords[&0], vec!["b2", "c3", "a1", "d4"]);
    }

    #[test]
    fn test_no_model_gives_empty_map() {
        assert!(cluster_keywords(None, &vocab(&["x"]), 10).is_empty());
    }
}
