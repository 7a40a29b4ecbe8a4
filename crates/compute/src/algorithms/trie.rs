use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use varscope_core::{VariantCount, START};

/// Index of a node inside a [`VariantTrie`] arena.
pub type TrieNodeId = usize;

/// One node of the prefix tree.
///
/// `frequency` counts every case whose variant passes through this node.
#[derive(Debug, Clone, Serialize)]
pub struct TrieNode {
    pub label: String,
    pub parent: Option<TrieNodeId>,
    /// Children keyed by activity label, in insertion order.
    pub children: IndexMap<String, TrieNodeId>,
    pub frequency: u64,
    pub depth: usize,
}

/// Prefix-sharing tree over variants, stored as an arena.
///
/// The arena owns every node; parents reference children by index only.
/// Nodes are never removed.
#[derive(Debug, Clone, Serialize)]
pub struct VariantTrie {
    nodes: Vec<TrieNode>,
}

impl VariantTrie {
    pub const ROOT: TrieNodeId = 0;

    /// An empty trie: a lone `START` root with frequency 0.
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode {
                label: START.to_string(),
                parent: None,
                children: IndexMap::new(),
                frequency: 0,
                depth: 0,
            }],
        }
    }

    /// Build a trie by inserting every selected variant in order.
    pub fn build(selected: &[VariantCount]) -> Self {
        let mut trie = Self::new();
        for entry in selected {
            trie.insert(entry.variant.activities(), entry.frequency);
        }
        debug!(
            variants = selected.len(),
            nodes = trie.len(),
            total = trie.root().frequency,
            "variant trie built"
        );
        trie
    }

    /// Build from at most the first `top_n` variants (`None` = all).
    pub fn build_top_n(selected: &[VariantCount], top_n: Option<usize>) -> Self {
        let end = top_n.map_or(selected.len(), |n| n.min(selected.len()));
        Self::build(&selected[..end])
    }

    /// Add one variant's cases to every node on its path, creating nodes as needed.
    pub fn insert(&mut self, activities: &[String], frequency: u64) {
        let mut current = Self::ROOT;
        self.nodes[current].frequency += frequency;

        for activity in activities {
            let next = match self.nodes[current].children.get(activity) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    let depth = self.nodes[current].depth + 1;
                    self.nodes.push(TrieNode {
                        label: activity.clone(),
                        parent: Some(current),
                        children: IndexMap::new(),
                        frequency: 0,
                        depth,
                    });
                    self.nodes[current].children.insert(activity.clone(), child);
                    child
                }
            };
            self.nodes[next].frequency += frequency;
            current = next;
        }
    }

    pub fn root(&self) -> &TrieNode {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, id: TrieNodeId) -> Option<&TrieNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[TrieNode] {
        &self.nodes
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root().frequency == 0 && self.nodes.len() == 1
    }

    /// Follow a label path from the root.
    pub fn find(&self, activities: &[&str]) -> Option<TrieNodeId> {
        let mut current = Self::ROOT;
        for activity in activities {
            current = *self.nodes[current].children.get(*activity)?;
        }
        Some(current)
    }

    /// Activity labels from the root (exclusive) down to `id` (inclusive).
    pub fn path(&self, id: TrieNodeId) -> Vec<&str> {
        let mut labels = Vec::new();
        let mut cursor = Some(id);
        while let Some(node_id) = cursor {
            let node = &self.nodes[node_id];
            if node.parent.is_some() {
                labels.push(node.label.as_str());
            }
            cursor = node.parent;
        }
        labels.reverse();
        labels
    }

    /// Cases whose variant ends exactly at this node.
    pub fn end_count(&self, id: TrieNodeId) -> u64 {
        let node = &self.nodes[id];
        let through_children: u64 = node
            .children
            .values()
            .map(|&c| self.nodes[c].frequency)
            .sum();
        node.frequency - through_children
    }

    /// Node ids in pre-order, children in insertion order.
    pub fn depth_first(&self) -> Vec<TrieNodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.values().rev().copied());
        }
        order
    }

    /// Deepest node depth (0 for a lone root).
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Nested, read-only view for rendering collaborators.
    pub fn export(&self) -> TrieExport {
        self.export_node(Self::ROOT)
    }

    fn export_node(&self, id: TrieNodeId) -> TrieExport {
        let node = &self.nodes[id];
        TrieExport {
            label: node.label.clone(),
            frequency: node.frequency,
            children: node
                .children
                .values()
                .map(|&child| self.export_node(child))
                .collect(),
        }
    }
}

impl Default for VariantTrie {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable nested form of a trie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrieExport {
    pub label: String,
    pub frequency: u64,
    pub children: Vec<TrieExport>,
}
