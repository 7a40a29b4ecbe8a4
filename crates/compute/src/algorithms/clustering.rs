use std::str::FromStr;

use tracing::debug;

use super::agglomerative::agglomerative;
use super::kmeans::kmeans;
use super::minibatch_kmeans::MiniBatchKMeans;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClusteringError {
    #[error("cannot cluster an empty point set")]
    EmptyInput,
    #[error("k must be in 1..={n}, got {k}")]
    InvalidK { k: usize, n: usize },
    #[error("point {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown clustering method: {0}")]
    UnknownMethod(String),
    #[error("label {label} out of range for k = {k}")]
    LabelOutOfRange { label: usize, k: usize },
    #[error("clusterer returned {actual} labels for {expected} points")]
    LabelCount { expected: usize, actual: usize },
}

/// Partitions points into `k` groups.
///
/// Implementations return one label per point, every label in `0..k`, and
/// must be deterministic for a fixed configuration. Some labels may be unused.
pub trait Clusterer: Send + Sync {
    fn name(&self) -> &str;

    fn cluster(&self, points: &[Vec<f64>], k: usize) -> Result<Vec<usize>, ClusteringError>;
}

/// Check the shared preconditions of every clustering method.
pub fn validate_points(points: &[Vec<f64>], k: usize) -> Result<(), ClusteringError> {
    if points.is_empty() {
        return Err(ClusteringError::EmptyInput);
    }
    if k == 0 || k > points.len() {
        return Err(ClusteringError::InvalidK { k, n: points.len() });
    }
    let expected = points[0].len();
    if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| p.len() != expected) {
        return Err(ClusteringError::DimensionMismatch {
            index,
            expected,
            actual: p.len(),
        });
    }
    Ok(())
}

/// Which algorithm partitions a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMethod {
    /// Agglomerative up to the switchover size, mini-batch k-means above it.
    Auto,
    /// Exact Ward-linkage agglomerative clustering.
    Agglomerative,
    /// Full-batch Lloyd's k-means.
    KMeans,
    /// Seeded mini-batch k-means.
    MiniBatch,
}

impl FromStr for ClusterMethod {
    type Err = ClusteringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "agglomerative" | "ward" => Ok(Self::Agglomerative),
            "kmeans" | "lloyd" => Ok(Self::KMeans),
            "minibatch" | "minibatch_kmeans" => Ok(Self::MiniBatch),
            other => Err(ClusteringError::UnknownMethod(other.to_string())),
        }
    }
}

/// The clustering strategy used by the hierarchy builder.
///
/// Under [`ClusterMethod::Auto`], pools with more than `switchover` points are
/// clustered with mini-batch k-means; smaller pools use agglomerative
/// clustering. Agglomerative always yields exactly `k` non-empty groups;
/// k-means variants may leave a group empty.
#[derive(Debug, Clone)]
pub struct ClusteringStrategy {
    pub method: ClusterMethod,
    pub switchover: usize,
    pub batch_size: usize,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for ClusteringStrategy {
    fn default() -> Self {
        Self {
            method: ClusterMethod::Auto,
            switchover: 1000,
            batch_size: 1000,
            max_iterations: 100,
            seed: 42,
        }
    }
}

impl ClusteringStrategy {
    /// The concrete method used for a pool of `n` points.
    pub fn method_for(&self, n: usize) -> ClusterMethod {
        match self.method {
            ClusterMethod::Auto if n > self.switchover => ClusterMethod::MiniBatch,
            ClusterMethod::Auto => ClusterMethod::Agglomerative,
            other => other,
        }
    }
}

impl Clusterer for ClusteringStrategy {
    fn name(&self) -> &str {
        match self.method {
            ClusterMethod::Auto => "auto",
            ClusterMethod::Agglomerative => "agglomerative",
            ClusterMethod::KMeans => "kmeans",
            ClusterMethod::MiniBatch => "minibatch",
        }
    }

    fn cluster(&self, points: &[Vec<f64>], k: usize) -> Result<Vec<usize>, ClusteringError> {
        validate_points(points, k)?;
        let method = self.method_for(points.len());
        debug!(n = points.len(), k, ?method, "clustering pool");

        let labels = match method {
            ClusterMethod::Agglomerative | ClusterMethod::Auto => agglomerative(points, k),
            ClusterMethod::KMeans => kmeans(points, k, self.max_iterations).labels,
            ClusterMethod::MiniBatch => {
                MiniBatchKMeans::new(self.batch_size, self.max_iterations, self.seed)
                    .fit(points, k)
                    .labels
            }
        };
        Ok(labels)
    }
}

/// Squared Euclidean distance.
#[inline]
pub(crate) fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Find the index of the nearest centroid.
pub(crate) fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f64::MAX;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs(per: usize) -> Vec<Vec<f64>> {
        let mut pts = Vec::new();
        for i in 0..per {
            pts.push(vec![i as f64 * 0.01, 0.0]);
        }
        for i in 0..per {
            pts.push(vec![50.0 + i as f64 * 0.01, 50.0]);
        }
        pts
    }

    #[test]
    fn method_parsing() {
        assert_eq!("auto".parse::<ClusterMethod>().unwrap(), ClusterMethod::Auto);
        assert_eq!("Ward".parse::<ClusterMethod>().unwrap(), ClusterMethod::Agglomerative);
        assert_eq!("kmeans".parse::<ClusterMethod>().unwrap(), ClusterMethod::KMeans);
        assert_eq!("minibatch".parse::<ClusterMethod>().unwrap(), ClusterMethod::MiniBatch);
        assert!("spectral".parse::<ClusterMethod>().is_err());
    }

    #[test]
    fn auto_switches_on_pool_size() {
        let s = ClusteringStrategy {
            switchover: 10,
            ..Default::default()
        };
        assert_eq!(s.method_for(10), ClusterMethod::Agglomerative);
        assert_eq!(s.method_for(11), ClusterMethod::MiniBatch);
    }

    #[test]
    fn validate_rejects_bad_input() {
        assert_eq!(validate_points(&[], 1), Err(ClusteringError::EmptyInput));
        assert_eq!(
            validate_points(&[vec![1.0]], 2),
            Err(ClusteringError::InvalidK { k: 2, n: 1 })
        );
        assert_eq!(
            validate_points(&[vec![1.0], vec![1.0, 2.0]], 1),
            Err(ClusteringError::DimensionMismatch {
                index: 1,
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn every_method_separates_blobs() {
        for method in [
            ClusterMethod::Auto,
            ClusterMethod::Agglomerative,
            ClusterMethod::KMeans,
            ClusterMethod::MiniBatch,
        ] {
            let strategy = ClusteringStrategy {
                method,
                batch_size: 8,
                ..Default::default()
            };
            let pts = two_blobs(12);
            let labels = strategy.cluster(&pts, 2).unwrap();
            assert_eq!(labels.len(), 24);
            assert!(labels.iter().all(|&l| l < 2));
            assert!(labels[..12].iter().all(|&l| l == labels[0]), "{method:?}");
            assert!(labels[12..].iter().all(|&l| l == labels[12]), "{method:?}");
            assert_ne!(labels[0], labels[12], "{method:?}");
        }
    }

    #[test]
    fn same_seed_same_labels() {
        let strategy = ClusteringStrategy {
            method: ClusterMethod::MiniBatch,
            batch_size: 5,
            ..Default::default()
        };
        let pts = two_blobs(20);
        assert_eq!(strategy.cluster(&pts, 3).unwrap(), strategy.cluster(&pts, 3).unwrap());
    }
}
