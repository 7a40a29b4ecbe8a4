use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use varscope_core::Variant;
use varscope_ingest::EmbeddingError;

use crate::algorithms::clustering::ClusteringError;

/// Identifier of a node in a [`HierarchyTree`].
pub type HierarchyNodeId = u64;

/// Id of the root node (the globally most frequent variant).
pub const ROOT_ID: HierarchyNodeId = 0;

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("cannot build a hierarchy from an empty variant set")]
    EmptyInput,
    #[error("embedding failed: {0}")]
    EmbeddingFailure(#[from] EmbeddingError),
    #[error("clustering failed: {0}")]
    Clustering(#[from] ClusteringError),
}

/// Shape limits for [`super::SimilarityHierarchyBuilder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Pools reached below this level become leaves.
    pub max_levels: usize,
    /// Upper bound on clusters per split.
    pub max_clusters: usize,
    /// Pools of at most this many variants become leaves.
    pub min_cluster_size: usize,
    /// Texts per embedding request.
    pub embed_batch_size: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_levels: 4,
            max_clusters: 10,
            min_cluster_size: 10,
            embed_batch_size: 64,
        }
    }
}

impl HierarchyConfig {
    pub fn validate(&self) -> Result<(), HierarchyError> {
        if self.max_clusters < 1 {
            return Err(HierarchyError::InvalidConfiguration(format!(
                "max_clusters must be >= 1, got {}",
                self.max_clusters
            )));
        }
        if self.min_cluster_size < 1 {
            return Err(HierarchyError::InvalidConfiguration(format!(
                "min_cluster_size must be >= 1, got {}",
                self.min_cluster_size
            )));
        }
        Ok(())
    }
}

/// A variant placed in the hierarchy. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: HierarchyNodeId,
    pub variant: Variant,
    pub frequency: u64,
    /// `None` only for the root.
    pub parent: Option<HierarchyNodeId>,
    pub level: usize,
}

/// Flat node list plus a parent → children index derived from it.
///
/// The index maps `None` to `[ROOT_ID]` and every other parent id to its
/// children in creation order.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyTree {
    nodes: Vec<HierarchyNode>,
    #[serde(skip)]
    children: IndexMap<Option<HierarchyNodeId>, Vec<HierarchyNodeId>>,
}

impl HierarchyTree {
    /// Derive the children index from a finished node list in one pass.
    /// The list must be non-empty with the root first.
    pub(crate) fn from_nodes(nodes: Vec<HierarchyNode>) -> Self {
        let mut children: IndexMap<Option<HierarchyNodeId>, Vec<HierarchyNodeId>> = IndexMap::new();
        for node in &nodes {
            children.entry(node.parent).or_default().push(node.id);
        }
        Self { nodes, children }
    }

    pub fn root(&self) -> &HierarchyNode {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids are assigned densely in creation order, so lookup is positional.
    pub fn node(&self, id: HierarchyNodeId) -> Option<&HierarchyNode> {
        self.nodes.get(id as usize).filter(|n| n.id == id)
    }

    pub fn children_of(&self, parent: Option<HierarchyNodeId>) -> &[HierarchyNodeId] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn max_level(&self) -> usize {
        self.nodes.iter().map(|n| n.level).max().unwrap_or(0)
    }
}
