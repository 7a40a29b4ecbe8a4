use tracing::{debug, info};

use varscope_core::VariantCount;
use varscope_ingest::embedding::{embed_all, Embedder, EmbeddingError};

use crate::algorithms::clustering::{Clusterer, ClusteringError, ClusteringStrategy};

use super::types::{
    HierarchyConfig, HierarchyError, HierarchyNode, HierarchyNodeId, HierarchyTree, ROOT_ID,
};

/// Builds a similarity-driven cluster tree over variants.
///
/// The most frequent variant becomes the root. The rest are split into at
/// most `max_clusters` groups by embedding similarity; each group's most
/// frequent member becomes a child of the current parent and the remaining
/// members are split again beneath it. Pools at or below
/// `min_cluster_size`, or reached deeper than `max_levels`, are attached as
/// leaves.
pub struct SimilarityHierarchyBuilder {
    config: HierarchyConfig,
    clusterer: Box<dyn Clusterer>,
}

/// Working state of one build. The node list is append-only.
struct BuildState<'a> {
    variants: &'a [VariantCount],
    embeddings: &'a [Vec<f64>],
    nodes: Vec<HierarchyNode>,
}

impl BuildState<'_> {
    fn emit(&mut self, idx: usize, parent: HierarchyNodeId, level: usize) -> HierarchyNodeId {
        let id = self.nodes.len() as HierarchyNodeId;
        let entry = &self.variants[idx];
        self.nodes.push(HierarchyNode {
            id,
            variant: entry.variant.clone(),
            frequency: entry.frequency,
            parent: Some(parent),
            level,
        });
        id
    }
}

impl SimilarityHierarchyBuilder {
    pub fn new(config: HierarchyConfig, clusterer: impl Clusterer + 'static) -> Self {
        Self {
            config,
            clusterer: Box::new(clusterer),
        }
    }

    /// Builder using the default agglomerative / mini-batch strategy.
    pub fn with_default_clustering(config: HierarchyConfig) -> Self {
        Self::new(config, ClusteringStrategy::default())
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Embed every variant once, up front, then build the tree.
    ///
    /// Any embedding failure aborts the build; no partial tree is returned.
    pub async fn build(
        &self,
        variants: &[VariantCount],
        embedder: &dyn Embedder,
    ) -> Result<HierarchyTree, HierarchyError> {
        self.config.validate()?;
        if variants.is_empty() {
            return Err(HierarchyError::EmptyInput);
        }

        let texts: Vec<String> = variants.iter().map(|v| v.variant.to_text()).collect();
        let embeddings = embed_all(embedder, &texts, self.config.embed_batch_size).await?;
        let points: Vec<Vec<f64>> = embeddings
            .into_iter()
            .map(|e| e.into_iter().map(f64::from).collect())
            .collect();

        self.build_from_embeddings(variants, &points)
    }

    /// Build the tree from precomputed embeddings, one per variant.
    pub fn build_from_embeddings(
        &self,
        variants: &[VariantCount],
        embeddings: &[Vec<f64>],
    ) -> Result<HierarchyTree, HierarchyError> {
        self.config.validate()?;
        if variants.is_empty() {
            return Err(HierarchyError::EmptyInput);
        }
        if embeddings.len() != variants.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: variants.len(),
                actual: embeddings.len(),
            }
            .into());
        }

        info!(
            variants = variants.len(),
            max_levels = self.config.max_levels,
            max_clusters = self.config.max_clusters,
            min_cluster_size = self.config.min_cluster_size,
            clusterer = self.clusterer.name(),
            "building variant hierarchy"
        );

        let all: Vec<usize> = (0..variants.len()).collect();
        let root_idx = most_frequent(variants, &all);
        let root = &variants[root_idx];

        let mut state = BuildState {
            variants,
            embeddings,
            nodes: vec![HierarchyNode {
                id: ROOT_ID,
                variant: root.variant.clone(),
                frequency: root.frequency,
                parent: None,
                level: 0,
            }],
        };

        let pool: Vec<usize> = all.into_iter().filter(|&i| i != root_idx).collect();
        self.partition(&mut state, pool, ROOT_ID, 1)?;

        let tree = HierarchyTree::from_nodes(state.nodes);
        info!(
            nodes = tree.len(),
            max_level = tree.max_level(),
            root_children = tree.children_of(Some(ROOT_ID)).len(),
            "variant hierarchy built"
        );
        Ok(tree)
    }

    /// Place `pool` beneath `parent`; nodes created here sit at `level`.
    fn partition(
        &self,
        state: &mut BuildState<'_>,
        pool: Vec<usize>,
        parent: HierarchyNodeId,
        level: usize,
    ) -> Result<(), HierarchyError> {
        if pool.is_empty() {
            return Ok(());
        }

        if level > self.config.max_levels || pool.len() <= self.config.min_cluster_size {
            for idx in pool {
                state.emit(idx, parent, level);
            }
            return Ok(());
        }

        let k = self.config.max_clusters.min(pool.len());
        let points: Vec<Vec<f64>> = pool.iter().map(|&i| state.embeddings[i].clone()).collect();
        let labels = self.clusterer.cluster(&points, k)?;
        if labels.len() != pool.len() {
            return Err(ClusteringError::LabelCount {
                expected: pool.len(),
                actual: labels.len(),
            }
            .into());
        }

        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (&label, &idx) in labels.iter().zip(&pool) {
            match groups.get_mut(label) {
                Some(group) => group.push(idx),
                None => return Err(ClusteringError::LabelOutOfRange { label, k }.into()),
            }
        }
        debug!(
            parent,
            level,
            pool = pool.len(),
            k,
            non_empty = groups.iter().filter(|g| !g.is_empty()).count(),
            "split pool"
        );

        for group in groups {
            if group.is_empty() {
                continue;
            }
            let rep = most_frequent(state.variants, &group);
            let node_id = state.emit(rep, parent, level);
            let rest: Vec<usize> = group.into_iter().filter(|&i| i != rep).collect();
            self.partition(state, rest, node_id, level + 1)?;
        }
        Ok(())
    }
}

/// Index (from `candidates`) of the highest-frequency variant; first wins ties.
fn most_frequent(variants: &[VariantCount], candidates: &[usize]) -> usize {
    let mut best = candidates[0];
    for &idx in &candidates[1..] {
        if variants[idx].frequency > variants[best].frequency {
            best = idx;
        }
    }
    best
}
