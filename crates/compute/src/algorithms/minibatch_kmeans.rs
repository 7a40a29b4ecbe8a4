use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use super::clustering::{nearest_centroid, squared_euclidean};
use super::kmeans::kmeanspp_init;

/// Mini-batch K-means for large pools.
///
/// Each iteration samples `batch_size` points with a seeded RNG, assigns
/// them to the nearest centroid and moves that centroid with the online mean
/// update `c = c + (x - c) / n`, where `n` counts every point the centroid
/// has absorbed so far. A final full pass assigns every point. The same seed
/// always produces the same labels; the full-pass assignment runs on the
/// rayon pool and is collected in input order.
#[derive(Debug, Clone)]
pub struct MiniBatchKMeans {
    batch_size: usize,
    max_iterations: usize,
    seed: u64,
}

/// Stop once no centroid moved more than this (squared distance).
const TOLERANCE: f64 = 1e-10;

/// Output of [`MiniBatchKMeans::fit`].
#[derive(Debug, Clone)]
pub struct MiniBatchResult {
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    /// Points absorbed by each centroid during the mini-batch phase.
    pub counts: Vec<usize>,
    pub iterations: usize,
}

impl MiniBatchKMeans {
    pub fn new(batch_size: usize, max_iterations: usize, seed: u64) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_iterations: max_iterations.max(1),
            seed,
        }
    }

    /// Cluster `points` into `k` groups.
    ///
    /// Callers validate input first: non-empty, `1 <= k <= points.len()`.
    pub fn fit(&self, points: &[Vec<f64>], k: usize) -> MiniBatchResult {
        debug_assert!(!points.is_empty() && k >= 1 && k <= points.len());

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = kmeanspp_init(points, k);
        let mut counts = vec![0usize; k];
        let mut iterations = 0;

        for _ in 0..self.max_iterations {
            iterations += 1;
            let batch: Vec<usize> = (0..self.batch_size)
                .map(|_| rng.gen_range(0..points.len()))
                .collect();

            // Assign the whole batch against the centroids from the start of
            // the iteration, then apply the updates in batch order.
            let assigned: Vec<usize> = batch
                .iter()
                .map(|&i| nearest_centroid(&points[i], &centroids))
                .collect();

            let before = centroids.clone();
            for (&i, &c) in batch.iter().zip(&assigned) {
                self.absorb(&mut centroids[c], &mut counts[c], &points[i]);
            }

            let max_shift = before
                .iter()
                .zip(&centroids)
                .map(|(a, b)| squared_euclidean(a, b))
                .fold(0.0, f64::max);
            if max_shift <= TOLERANCE {
                break;
            }
        }

        let labels: Vec<usize> = points
            .par_iter()
            .map(|p| nearest_centroid(p, &centroids))
            .collect();

        debug!(n = points.len(), k, iterations, "mini-batch k-means finished");
        MiniBatchResult {
            labels,
            centroids,
            counts,
            iterations,
        }
    }

    /// Online mean update of one centroid with one point.
    fn absorb(&self, centroid: &mut [f64], count: &mut usize, point: &[f64]) {
        *count += 1;
        let n = *count as f64;
        for (c, x) in centroid.iter_mut().zip(point.iter()) {
            *c += (x - *c) / n;
        }
    }
}
