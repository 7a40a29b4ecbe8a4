use super::clustering::{nearest_centroid, squared_euclidean};

/// Result of a full batch K-means run.
#[derive(Debug, Clone)]
pub struct KmeansResult {
    /// Cluster label of each point, in input order.
    pub labels: Vec<usize>,
    /// Final centroid vectors, indexed by label.
    pub centroids: Vec<Vec<f64>>,
    /// Number of clusters.
    pub k: usize,
    /// Number of Lloyd's iterations performed.
    pub iterations: usize,
    /// Sum of squared distances from each point to its assigned centroid.
    pub inertia: f64,
}

/// Run Lloyd's K-means algorithm.
///
/// Uses deterministic K-means++ style initialization. Iterates until
/// assignments stabilize or `max_iterations` is reached.
///
/// Callers validate input first (see `validate_points`): `points` non-empty,
/// `1 <= k <= points.len()`, equal dimensions.
pub fn kmeans(points: &[Vec<f64>], k: usize, max_iterations: usize) -> KmeansResult {
    debug_assert!(!points.is_empty() && k >= 1 && k <= points.len());

    let dim = points[0].len();
    let n = points.len();

    let mut centroids = kmeanspp_init(points, k);

    let mut labels = vec![0usize; n];
    let mut iterations = 0;

    for _ in 0..max_iterations.max(1) {
        iterations += 1;

        // Assignment step: assign each point to nearest centroid.
        let mut changed = false;
        for (i, point) in points.iter().enumerate() {
            let nearest = nearest_centroid(point, &centroids);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }

        if !changed && iterations > 1 {
            break;
        }

        // Update step: recompute centroids as mean of assigned points.
        let mut new_centroids = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];

        for (i, point) in points.iter().enumerate() {
            let cluster = labels[i];
            counts[cluster] += 1;
            for (j, &val) in point.iter().enumerate() {
                new_centroids[cluster][j] += val;
            }
        }

        for (c, centroid) in new_centroids.iter_mut().enumerate() {
            if counts[c] > 0 {
                let count = counts[c] as f64;
                for val in centroid.iter_mut() {
                    *val /= count;
                }
            } else {
                // Empty cluster: keep previous centroid.
                centroid.clone_from(&centroids[c]);
            }
        }

        centroids = new_centroids;
    }

    // Final assignment against the last centroids.
    for (i, point) in points.iter().enumerate() {
        labels[i] = nearest_centroid(point, &centroids);
    }
    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &c)| squared_euclidean(p, &centroids[c]))
        .sum();

    KmeansResult {
        labels,
        centroids,
        k,
        iterations,
        inertia,
    }
}

/// K-means++ style initialization: pick k centroids by greedy max-D².
///
/// The first centroid is the middle point, each next one the point farthest
/// from all centroids chosen so far. No randomness.
pub(crate) fn kmeanspp_init(points: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);

    centroids.push(points[n / 2].clone());

    for _ in 1..k {
        let mut best_idx = 0;
        let mut best_dist = f64::NEG_INFINITY;

        for (i, point) in points.iter().enumerate() {
            let min_dist = centroids
                .iter()
                .map(|c| squared_euclidean(point, c))
                .fold(f64::MAX, f64::min);
            if min_dist > best_dist {
                best_dist = min_dist;
                best_idx = i;
            }
        }

        centroids.push(points[best_idx].clone());
    }

    centroids
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: generate points in well-separated clusters for testing.
    fn make_clusters(centers: &[(f64, f64)], points_per_cluster: usize) -> Vec<Vec<f64>> {
        let mut result = Vec::new();
        for &(cx, cy) in centers {
            for i in 0..points_per_cluster {
                let offset = (i as f64) * 0.1;
                result.push(vec![cx + offset, cy + offset]);
            }
        }
        result
    }

    #[test]
    fn basic_kmeans_two_clusters() {
        let points = make_clusters(&[(0.0, 0.0), (100.0, 100.0)], 10);
        let result = kmeans(&points, 2, 100);

        assert_eq!(result.k, 2);
        assert_eq!(result.centroids.len(), 2);
        assert_eq!(result.labels.len(), 20);

        let c0 = result.labels[0];
        assert!(result.labels[..10].iter().all(|&l| l == c0));
        let c1 = result.labels[10];
        assert_ne!(c0, c1);
        assert!(result.labels[10..].iter().all(|&l| l == c1));
    }

    #[test]
    fn kmeans_single_cluster() {
        let points = make_clusters(&[(5.0, 5.0)], 20);
        let result = kmeans(&points, 1, 100);
        assert!(result.labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn kmeans_three_clusters() {
        let points = make_clusters(&[(0.0, 0.0), (50.0, 50.0), (100.0, 100.0)], 15);
        let result = kmeans(&points, 3, 100);

        let c0 = result.labels[0];
        let c1 = result.labels[15];
        let c2 = result.labels[30];
        assert!(result.labels[..15].iter().all(|&l| l == c0));
        assert!(result.labels[15..30].iter().all(|&l| l == c1));
        assert!(result.labels[30..].iter().all(|&l| l == c2));
        assert_ne!(c0, c1);
        assert_ne!(c1, c2);
        assert_ne!(c0, c2);
    }

    #[test]
    fn kmeans_converges_quickly_on_separable_data() {
        let points = make_clusters(&[(0.0, 0.0), (1000.0, 1000.0)], 5);
        let result = kmeans(&points, 2, 100);
        assert!(result.iterations <= 5, "iterations: {}", result.iterations);
    }

    #[test]
    fn inertia_is_non_negative() {
        let points = make_clusters(&[(0.0, 0.0), (10.0, 10.0)], 10);
        let result = kmeans(&points, 2, 100);
        assert!(result.inertia >= 0.0);
    }

    #[test]
    fn k_equal_to_n_gives_each_point_its_own_label() {
        let points = vec![vec![0.0], vec![10.0], vec![20.0]];
        let mut labels = kmeans(&points, 3, 10).labels;
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn kmeanspp_init_picks_spread_centroids() {
        let points = make_clusters(&[(0.0, 0.0), (100.0, 100.0)], 5);
        let centroids = kmeanspp_init(&points, 2);

        assert_eq!(centroids.len(), 2);
        let dist = squared_euclidean(&centroids[0], &centroids[1]);
        assert!(dist > 1000.0, "centroids too close: dist²={}", dist);
    }
}
