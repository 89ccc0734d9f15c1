//! Cluster-count selection with the elbow heuristic.

use crate::clustering::kmeans::{self, KMeansParams};
use crate::clustering::vectorize::FeatureMatrix;
use tracing::{debug, info};

/// Smallest candidate cluster count.
pub const MIN_K: usize = 2;

/// Pick a `k` from WCSS values recorded for `k = 2, 3, ...`.
///
/// The first differences of `wcss` are divided pairwise
/// (`diff[i] / diff[i + 1]`) and the position of the largest ratio, offset
/// by [`MIN_K`], is the answer. Ratios that are not finite (a plateau makes
/// the denominator zero) are ignored; with no usable ratio the answer is
/// [`MIN_K`]. The first maximum wins ties.
pub fn elbow_from_wcss(wcss: &[f64]) -> usize {
    let diffs: Vec<f64> = wcss.windows(2).map(|w| w[1] - w[0]).collect();

    let mut best: Option<(usize, f64)> = None;
    for (i, pair) in diffs.windows(2).enumerate() {
        let ratio = pair[0] / pair[1];
        if !ratio.is_finite() {
            continue;
        }
        if best.is_none_or(|(_, r)| ratio > r) {
            best = Some((i, ratio));
        }
    }

    best.map_or(MIN_K, |(i, _)| i + MIN_K)
}

/// Fit k-means for every candidate `k` and choose one with [`elbow_from_wcss`].
///
/// Candidates run over `[2, min(max_k, n - 1)]`. With fewer than three rows
/// nothing is fitted and 2 is returned.
pub fn select_cluster_count(matrix: &FeatureMatrix, max_k: usize, seed: u64, n_init: usize) -> usize {
    let n = matrix.len();
    if n < 3 {
        debug!(documents = n, "Corpus too small for elbow selection");
        return MIN_K;
    }

    let upper = max_k.min(n - 1);
    let wcss: Vec<f64> = (MIN_K..=upper)
        .filter_map(|k| kmeans::fit(matrix, &KMeansParams::new(k, seed, n_init)))
        .map(|fit| fit.inertia)
        .collect();

    let k = elbow_from_wcss(&wcss);
    info!(k, candidates = wcss.len(), ?wcss, "Selected cluster count");
    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::vectorize::FeatureRow;

    #[test]
    fn test_picks_largest_ratio_of_differences() {
        // diffs [-20, -10, -5, -2], ratios [2, 2, 2.5]
        assert_eq!(elbow_from_wcss(&[100.0, 80.0, 70.0, 65.0, 63.0]), 4);
    }

    #[test]
    fn test_first_maximum_wins() {
        // diffs [-8, -4, -2], ratios [2, 2]
        assert_eq!(elbow_from_wcss(&[20.0, 12.0, 8.0, 6.0]), 2);
    }

    #[test]
    fn test_plateau_ratios_are_skipped() {
        // diffs [-10, 0, -5]: the first ratio divides by zero.
        assert_eq!(elbow_from_wcss(&[50.0, 40.0, 40.0, 35.0]), 3);
        assert_eq!(elbow_from_wcss(&[5.0, 5.0, 5.0, 5.0]), 2);
    }

    #[test]
    fn test_too_few_values_default_to_two() {
        assert_eq!(elbow_from_wcss(&[]), 2);
        assert_eq!(elbow_from_wcss(&[3.0]), 2);
        assert_eq!(elbow_from_wcss(&[3.0, 1.0]), 2);
    }

    fn diagonal(n: usize) -> FeatureMatrix {
        let rows = (0..n).map(|i| FeatureRow::new(vec![(i, 1.0)])).collect();
        FeatureMatrix::new(rows, n)
    }

    #[test]
    fn test_small_corpus_returns_two_without_fitting() {
        assert_eq!(select_cluster_count(&diagonal(2), 10, 42, 10), 2);
        assert_eq!(select_cluster_count(&diagonal(0), 10, 42, 10), 2);
    }

    #[test]
    fn test_selection_stays_in_range() {
        for n in 3..9 {
            let k = select_cluster_count(&diagonal(n), 10, 42, 4);
            assert!((2..=n - 1).contains(&k), "n={n} k={k}");
        }
        let k = select_cluster_count(&diagonal(12), 4, 42, 4);
        assert!((2..=4).contains(&k));
    }

    #[test]
    fn test_selection_is_reproducible() {
        let m = diagonal(8);
        assert_eq!(
            select_cluster_count(&m, 10, 42, 5),
            select_cluster_count(&m, 10, 42, 5)
        );
    }
}
