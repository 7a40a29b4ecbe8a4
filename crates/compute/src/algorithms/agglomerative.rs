//! Exact agglomerative clustering with Ward linkage.
//!
//! Starts from singletons and repeatedly merges the pair of clusters whose
//! union increases the within-cluster variance least, until `k` clusters
//! remain. Distances are kept in a dense matrix and updated with the
//! Lance-Williams recurrence, so memory is O(n²): meant for pools up to the
//! mini-batch switchover size.

use tracing::trace;

use super::clustering::squared_euclidean;

/// Cluster `points` into exactly `k` groups.
///
/// Labels are numbered by the smallest point index in each group, so the
/// group containing point 0 is label 0. Ties between equal merge costs go
/// to the lowest indices. Callers validate input first.
pub fn agglomerative(points: &[Vec<f64>], k: usize) -> Vec<usize> {
    let n = points.len();
    debug_assert!(n > 0 && k >= 1 && k <= n);

    let mut dist = DistanceMatrix::new(points);
    let mut size = vec![1usize; n];
    let mut active = vec![true; n];
    // Representative (lowest index) of the cluster each point belongs to.
    let mut owner: Vec<usize> = (0..n).collect();

    let mut nearest: Vec<(usize, f64)> = (0..n).map(|i| dist.nearest(i, &active)).collect();
    let mut clusters = n;

    while clusters > k {
        let (a, b) = match closest_pair(&nearest, &active) {
            Some(pair) => pair,
            None => break,
        };
        let d_ab = dist.get(a, b);
        trace!(a, b, cost = d_ab, "ward merge");

        for c in 0..n {
            if !active[c] || c == a || c == b {
                continue;
            }
            let (na, nb, nc) = (size[a] as f64, size[b] as f64, size[c] as f64);
            let updated = ((na + nc) * dist.get(a, c) + (nb + nc) * dist.get(b, c) - nc * d_ab)
                / (na + nb + nc);
            dist.set(a, c, updated);
        }

        active[b] = false;
        size[a] += size[b];
        for o in owner.iter_mut() {
            if *o == b {
                *o = a;
            }
        }
        clusters -= 1;

        for c in 0..n {
            if !active[c] {
                continue;
            }
            if c == a || nearest[c].0 == a || nearest[c].0 == b {
                nearest[c] = dist.nearest(c, &active);
            } else if dist.get(c, a) < nearest[c].1 {
                nearest[c] = (a, dist.get(c, a));
            }
        }
    }

    // Renumber representatives in ascending index order.
    let mut label_of = vec![usize::MAX; n];
    let mut next = 0;
    for (i, &is_active) in active.iter().enumerate() {
        if is_active {
            label_of[i] = next;
            next += 1;
        }
    }
    owner.iter().map(|&rep| label_of[rep]).collect()
}

/// Pair `(a, b)` with `a < b` and the smallest merge cost.
fn closest_pair(nearest: &[(usize, f64)], active: &[bool]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for (i, &(j, d)) in nearest.iter().enumerate() {
        if !active[i] || j == usize::MAX {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, _, bd)) => d < bd,
        };
        if better {
            best = Some((i.min(j), i.max(j), d));
        }
    }
    best.map(|(a, b, _)| (a, b))
}

/// Symmetric matrix of squared Euclidean distances, stored in full.
struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    fn new(points: &[Vec<f64>]) -> Self {
        let n = points.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = squared_euclidean(&points[i], &points[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Self { n, data }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, d: f64) {
        self.data[i * self.n + j] = d;
        self.data[j * self.n + i] = d;
    }

    /// Closest other active cluster to `i`; `(usize::MAX, inf)` if none.
    fn nearest(&self, i: usize, active: &[bool]) -> (usize, f64) {
        let mut best = (usize::MAX, f64::INFINITY);
        for j in 0..self.n {
            if j == i || !active[j] {
                continue;
            }
            let d = self.get(i, j);
            if d < best.1 {
                best = (j, d);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_equals_n_keeps_singletons() {
        let pts = vec![vec![0.0], vec![5.0], vec![9.0]];
        assert_eq!(agglomerative(&pts, 3), vec![0, 1, 2]);
    }

    #[test]
    fn k_one_merges_everything() {
        let pts = vec![vec![0.0], vec![5.0], vec![9.0], vec![100.0]];
        assert_eq!(agglomerative(&pts, 1), vec![0, 0, 0, 0]);
    }

    #[test]
    fn groups_nearby_points() {
        let pts = vec![
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![0.1, 0.0],
            vec![10.1, 10.0],
            vec![0.0, 0.2],
        ];
        assert_eq!(agglomerative(&pts, 2), vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn always_returns_exactly_k_groups() {
        let pts: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i * i % 17) as f64, (i % 5) as f64])
            .collect();
        for k in 1..=10 {
            let labels = agglomerative(&pts, k);
            let mut distinct = labels.clone();
            distinct.sort_unstable();
            distinct.dedup();
            assert_eq!(distinct, (0..k).collect::<Vec<_>>());
        }
    }

    #[test]
    fn duplicate_points_are_handled() {
        let pts = vec![vec![1.0], vec![1.0], vec![1.0], vec![7.0]];
        assert_eq!(agglomerative(&pts, 2), vec![0, 0, 0, 1]);
    }

    #[test]
    fn ward_prefers_balanced_merge() {
        // Single linkage would chain 0-1-2-3; Ward splits the line in half.
        let pts = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0], vec![10.0], vec![11.0]];
        let labels = agglomerative(&pts, 2);
        assert_eq!(labels, vec![0, 0, 0, 0, 1, 1]);
    }
}
