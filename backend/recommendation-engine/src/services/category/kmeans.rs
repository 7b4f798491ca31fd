// ============================================
// K-Means Clustering
// ============================================
//
// Lloyd iterations with k-means++ seeding from a fixed-seed StdRng, so a given
// input always produces the same clustering.
//
// - Distance: squared Euclidean
// - Ties between centroids resolve to the lowest index
// - A cluster that loses all its points keeps its previous centroid

use crate::error::{AppError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const MAX_ITERATIONS: usize = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    centroids: Array2<f64>,
}

impl KMeans {
    /// Fit `k` clusters over the rows of `data`.
    ///
    /// `k` is clamped to the number of distinct rows; fitting zero rows or
    /// zero clusters is an error.
    pub fn fit(data: &Array2<f64>, k: usize, seed: u64) -> Result<Self> {
        let n = data.nrows();
        if n == 0 {
            return Err(AppError::TrainingFailure(
                "cannot cluster an empty dataset".to_string(),
            ));
        }
        if k == 0 {
            return Err(AppError::TrainingFailure(
                "number of clusters must be at least 1".to_string(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(AppError::TrainingFailure(
                "dataset contains non-finite values".to_string(),
            ));
        }

        let k = k.min(distinct_rows(data));
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = seed_centroids(data, k, &mut rng);

        let mut labels = vec![usize::MAX; n];
        for _ in 0..MAX_ITERATIONS {
            let mut changed = false;
            for (i, row) in data.axis_iter(Axis(0)).enumerate() {
                let label = nearest(&centroids, row);
                if labels[i] != label {
                    labels[i] = label;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
            let mut counts = vec![0usize; k];
            for (row, &label) in data.axis_iter(Axis(0)).zip(&labels) {
                let mut sum = sums.row_mut(label);
                sum += &row;
                counts[label] += 1;
            }
            for (cluster, count) in counts.into_iter().enumerate() {
                if count > 0 {
                    let mean = &sums.row(cluster) / count as f64;
                    centroids.row_mut(cluster).assign(&mean);
                }
            }
        }

        Ok(Self { centroids })
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn predict(&self, point: ArrayView1<f64>) -> usize {
        nearest(&self.centroids, point)
    }
}

fn seed_centroids(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));
    centroids.row_mut(0).assign(&data.row(rng.gen_range(0..n)));

    let mut closest: Array1<f64> = data
        .axis_iter(Axis(0))
        .map(|row| squared_distance(row, centroids.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.sum();
        let mut target = rng.gen::<f64>() * total;
        let mut chosen = n - 1;
        for (i, weight) in closest.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            if target < *weight {
                chosen = i;
                break;
            }
            target -= weight;
            chosen = i;
        }

        centroids.row_mut(c).assign(&data.row(chosen));
        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            let d = squared_distance(row, centroids.row(c));
            if d < closest[i] {
                closest[i] = d;
            }
        }
    }

    centroids
}

fn nearest(centroids: &Array2<f64>, point: ArrayView1<f64>) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let d = squared_distance(point, centroid);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn distinct_rows(data: &Array2<f64>) -> usize {
    data.axis_iter(Axis(0))
        .map(|row| row.iter().map(|v| v.to_bits()).collect::<Vec<u64>>())
        .collect::<HashSet<_>>()
        .len()
}
