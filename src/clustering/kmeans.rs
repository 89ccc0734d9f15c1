//! Seeded k-means over sparse TF-IDF rows.
//!
//! Initial centroids are chosen with k-means++ and refined with Lloyd
//! iterations. `n_init` restarts draw from one seeded generator, and the
//! fit with the lowest inertia is kept, so the same matrix, `k` and seed
//! always give the same assignment vector.

use crate::clustering::vectorize::{FeatureMatrix, FeatureRow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub k: usize,
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    /// Relative tolerance on the total squared centroid shift.
    pub tol: f64,
}

impl KMeansParams {
    pub fn new(k: usize, seed: u64, n_init: usize) -> Self {
        Self {
            k,
            seed,
            n_init,
            max_iter: 300,
            tol: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster id in `[0, k)` for every row.
    pub labels: Vec<usize>,
    /// `k` dense centroids over the matrix columns.
    pub centroids: Vec<Vec<f64>>,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
}

struct Centroid {
    values: Vec<f64>,
    sq_norm: f64,
}

impl Centroid {
    fn new(values: Vec<f64>) -> Self {
        let sq_norm = values.iter().map(|v| v * v).sum();
        Self { values, sq_norm }
    }

    fn distance(&self, row: &FeatureRow, row_sq: f64) -> f64 {
        (row_sq - 2.0 * row.dot(&self.values) + self.sq_norm).max(0.0)
    }
}

fn nearest(row: &FeatureRow, row_sq: f64, centroids: &[Centroid]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = c.distance(row, row_sq);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn mean_variance(matrix: &FeatureMatrix) -> f64 {
    let n = matrix.len() as f64;
    let dims = matrix.n_features();
    if dims == 0 || matrix.is_empty() {
        return 0.0;
    }
    let mut sum = vec![0.0; dims];
    let mut sum_sq = vec![0.0; dims];
    for row in matrix.rows() {
        for (col, v) in row.entries() {
            sum[*col] += v;
            sum_sq[*col] += v * v;
        }
    }
    let total: f64 = sum
        .iter()
        .zip(&sum_sq)
        .map(|(s, sq)| (sq / n - (s / n).powi(2)).max(0.0))
        .sum();
    total / dims as f64
}

fn plus_plus(matrix: &FeatureMatrix, norms: &[f64], k: usize, rng: &mut StdRng) -> Vec<Centroid> {
    let rows = matrix.rows();
    let dims = matrix.n_features();

    let first = rng.random_range(0..rows.len());
    let mut centroids = vec![Centroid::new(rows[first].to_dense(dims))];
    let mut closest: Vec<f64> = rows
        .iter()
        .zip(norms)
        .map(|(row, sq)| centroids[0].distance(row, *sq))
        .collect();

    while centroids.len() < k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            closest
                .iter()
                .position(|d| {
                    cumulative += d;
                    cumulative > target
                })
                .unwrap_or(rows.len() - 1)
        } else {
            // Every row already sits on a centroid.
            rng.random_range(0..rows.len())
        };

        let centroid = Centroid::new(rows[pick].to_dense(dims));
        for ((row, sq), best) in rows.iter().zip(norms).zip(closest.iter_mut()) {
            *best = best.min(centroid.distance(row, *sq));
        }
        centroids.push(centroid);
    }
    centroids
}

fn lloyd(
    matrix: &FeatureMatrix,
    norms: &[f64],
    mut centroids: Vec<Centroid>,
    params: &KMeansParams,
    tolerance: f64,
) -> KMeansFit {
    let rows = matrix.rows();
    let dims = matrix.n_features();
    let k = centroids.len();
    let mut labels = vec![0; rows.len()];

    for iteration in 0..params.max_iter {
        for (i, (row, sq)) in rows.iter().zip(norms).enumerate() {
            labels[i] = nearest(row, *sq, &centroids).0;
        }

        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (row, label) in rows.iter().zip(&labels) {
            counts[*label] += 1;
            for (col, v) in row.entries() {
                sums[*label][*col] += v;
            }
        }

        let mut shift = 0.0;
        let updated: Vec<Centroid> = sums
            .into_iter()
            .zip(counts)
            .zip(&centroids)
            .map(|((mut sum, count), old)| {
                if count == 0 {
                    return Centroid::new(old.values.clone());
                }
                for v in &mut sum {
                    *v /= count as f64;
                }
                shift += sum
                    .iter()
                    .zip(&old.values)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>();
                Centroid::new(sum)
            })
            .collect();
        centroids = updated;

        if shift <= tolerance {
            debug!(iteration, shift, "k-means converged");
            break;
        }
    }

    let mut inertia = 0.0;
    for (i, (row, sq)) in rows.iter().zip(norms).enumerate() {
        let (label, distance) = nearest(row, *sq, &centroids);
        labels[i] = label;
        inertia += distance;
    }

    KMeansFit {
        labels,
        centroids: centroids.into_iter().map(|c| c.values).collect(),
        inertia,
    }
}

/// Partition `matrix` into `params.k` clusters.
///
/// Returns `None` when `k` is zero or larger than the number of rows.
pub fn fit(matrix: &FeatureMatrix, params: &KMeansParams) -> Option<KMeansFit> {
    if params.k == 0 || params.k > matrix.len() {
        return None;
    }

    let norms: Vec<f64> = matrix.rows().iter().map(FeatureRow::squared_norm).collect();
    let tolerance = params.tol * mean_variance(matrix);
    let mut rng = StdRng::seed_from_u64(params.seed);

    let mut best: Option<KMeansFit> = None;
    for _ in 0..params.n_init.max(1) {
        let seeds = plus_plus(matrix, &norms, params.k, &mut rng);
        let candidate = lloyd(matrix, &norms, seeds, params, tolerance);
        let better = best
            .as_ref()
            .is_none_or(|current| candidate.inertia < current.inertia);
        if better {
            best = Some(candidate);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(points: &[[f64; 2]]) -> FeatureMatrix {
        let rows = points
            .iter()
            .map(|p| {
                FeatureRow::new(
                    p.iter()
                        .enumerate()
                        .filter(|(_, v)| **v != 0.0)
                        .map(|(i, v)| (i, *v))
                        .collect(),
                )
            })
            .collect();
        FeatureMatrix::new(rows, 2)
    }

    fn two_groups() -> FeatureMatrix {
        matrix(&[
            [1.0, 0.0],
            [0.95, 0.05],
            [0.9, 0.1],
            [0.0, 1.0],
            [0.05, 0.95],
            [0.1, 0.9],
        ])
    }

    #[test]
    fn test_separates_obvious_groups() {
        let fit = fit(&two_groups(), &KMeansParams::new(2, 42, 10)).unwrap();
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[1], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_eq!(fit.labels[4], fit.labels[5]);
        assert_ne!(fit.labels[0], fit.labels[3]);
        assert_eq!(fit.centroids.len(), 2);
    }

    #[test]
    fn test_same_seed_same_assignment() {
        let m = two_groups();
        let params = KMeansParams::new(3, 42, 10);
        let a = fit(&m, &params).unwrap();
        let b = fit(&m, &params).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.inertia, b.inertia);
    }

    #[test]
    fn test_labels_are_in_range() {
        let m = two_groups();
        for k in 1..=m.len() {
            let fit = fit(&m, &KMeansParams::new(k, 7, 3)).unwrap();
            assert_eq!(fit.labels.len(), m.len());
            assert!(fit.labels.iter().all(|l| *l < k));
        }
    }

    #[test]
    fn test_one_cluster_per_point_has_zero_inertia() {
        let m = matrix(&[[1.0, 0.0], [0.0, 1.0], [0.6, 0.8]]);
        let fit = fit(&m, &KMeansParams::new(3, 42, 10)).unwrap();
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_rows_do_not_break_seeding() {
        let m = matrix(&[[1.0, 0.0], [1.0, 0.0], [1.0, 0.0]]);
        let fit = fit(&m, &KMeansParams::new(2, 42, 10)).unwrap();
        assert!(fit.labels.iter().all(|l| *l < 2));
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_invalid_k_is_rejected() {
        let m = two_groups();
        assert!(fit(&m, &KMeansParams::new(0, 42, 10)).is_none());
        assert!(fit(&m, &KMeansParams::new(7, 42, 10)).is_none());
    }
}
