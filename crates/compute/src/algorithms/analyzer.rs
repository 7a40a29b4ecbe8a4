use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::hierarchy::{HierarchyNodeId, HierarchyRecord};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyzerError {
    #[error("malformed hierarchy: {0}")]
    MalformedHierarchy(Malformation),
}

/// What makes a flat table not a single rooted tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Malformation {
    #[error("no parentless record")]
    NoRoot,
    #[error("{} parentless records: {ids:?}", .ids.len())]
    MultipleRoots { ids: Vec<HierarchyNodeId> },
    #[error("duplicate id {0}")]
    DuplicateId(HierarchyNodeId),
    #[error("record {id} references missing parent {parent}")]
    DanglingParent {
        id: HierarchyNodeId,
        parent: HierarchyNodeId,
    },
    #[error("record {id} is not connected to the root")]
    Unreachable { id: HierarchyNodeId },
}

impl From<Malformation> for AnalyzerError {
    fn from(m: Malformation) -> Self {
        AnalyzerError::MalformedHierarchy(m)
    }
}

/// Structural summary of a hierarchy table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyStats {
    pub total_nodes: usize,
    pub max_level: usize,
    /// Records per level, ascending by level.
    pub level_counts: BTreeMap<usize, usize>,
    pub root_id: HierarchyNodeId,
    /// Records whose parent is the root.
    pub root_children_count: usize,
    /// Records nobody names as parent.
    pub leaf_count: usize,
    /// Largest number of children under one record.
    pub max_branching: usize,
}

/// Derive depth, per-level population and top-level branching from a flat
/// hierarchy table.
///
/// The table must describe exactly one tree: one parentless record, unique
/// ids, every parent present, every record connected to the root.
pub fn analyze(records: &[HierarchyRecord]) -> Result<HierarchyStats, AnalyzerError> {
    let mut index: HashMap<HierarchyNodeId, usize> = HashMap::with_capacity(records.len());
    for (i, r) in records.iter().enumerate() {
        if index.insert(r.id, i).is_some() {
            return Err(Malformation::DuplicateId(r.id).into());
        }
    }

    let roots: Vec<HierarchyNodeId> = records
        .iter()
        .filter(|r| r.parent.is_none())
        .map(|r| r.id)
        .collect();
    let root_id = match roots.len() {
        0 => return Err(Malformation::NoRoot.into()),
        1 => roots[0],
        _ => return Err(Malformation::MultipleRoots { ids: roots }.into()),
    };

    let mut uf = UnionFind::new(records.len());
    let mut child_counts: HashMap<HierarchyNodeId, usize> = HashMap::new();
    for (i, r) in records.iter().enumerate() {
        let Some(parent) = r.parent else { continue };
        let Some(&p) = index.get(&parent) else {
            return Err(Malformation::DanglingParent { id: r.id, parent }.into());
        };
        uf.union(i, p);
        *child_counts.entry(parent).or_insert(0) += 1;
    }

    // With n records and n - 1 parent links, one component means no cycle.
    let root_set = uf.find(index[&root_id]);
    for (i, r) in records.iter().enumerate() {
        if uf.find(i) != root_set {
            return Err(Malformation::Unreachable { id: r.id }.into());
        }
    }

    let mut level_counts = BTreeMap::new();
    for r in records {
        *level_counts.entry(r.level).or_insert(0) += 1;
    }

    Ok(HierarchyStats {
        total_nodes: records.len(),
        max_level: level_counts.keys().next_back().copied().unwrap_or(0),
        level_counts,
        root_id,
        root_children_count: child_counts.get(&root_id).copied().unwrap_or(0),
        leaf_count: records.iter().filter(|r| !child_counts.contains_key(&r.id)).count(),
        max_branching: child_counts.values().copied().max().unwrap_or(0),
    })
}

impl fmt::Display for HierarchyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variant tree analysis:")?;
        writeln!(f, "  Total variants: {}", self.total_nodes)?;
        writeln!(f, "  Tree depth (max level): {}", self.max_level)?;
        writeln!(
            f,
            "  Number of clusters (children of most common variant): {}",
            self.root_children_count
        )?;
        writeln!(f, "  Leaves: {}, widest node: {} children", self.leaf_count, self.max_branching)?;
        writeln!(f, "  Nodes per level:")?;
        for (level, count) in &self.level_counts {
            writeln!(f, "    - Level {level}: {count} nodes")?;
        }
        Ok(())
    }
}

/// Union-Find (disjoint set) with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: u64, level: usize, parent: Option<u64>) -> HierarchyRecord {
        HierarchyRecord {
            id,
            level,
            frequency: 1,
            parent,
            path: format!("V{id}"),
        }
    }

    fn sample() -> Vec<HierarchyRecord> {
        vec![
            rec(0, 0, None),
            rec(1, 1, Some(0)),
            rec(2, 2, Some(1)),
            rec(3, 2, Some(1)),
            rec(4, 1, Some(0)),
            rec(5, 1, Some(0)),
        ]
    }

    #[test]
    fn counts_levels_and_root_children() {
        let stats = analyze(&sample()).unwrap();
        assert_eq!(stats.total_nodes, 6);
        assert_eq!(stats.max_level, 2);
        assert_eq!(stats.level_counts, BTreeMap::from([(0, 1), (1, 3), (2, 2)]));
        assert_eq!(stats.root_id, 0);
        assert_eq!(stats.root_children_count, 3);
        assert_eq!(stats.leaf_count, 4);
        assert_eq!(stats.max_branching, 3);
        assert_eq!(stats.level_counts.values().sum::<usize>(), stats.total_nodes);
    }

    #[test]
    fn lone_root() {
        let stats = analyze(&[rec(7, 0, None)]).unwrap();
        assert_eq!(stats.total_nodes, 1);
        assert_eq!(stats.root_id, 7);
        assert_eq!(stats.root_children_count, 0);
        assert_eq!(stats.leaf_count, 1);
    }

    #[test]
    fn root_need_not_be_first_or_zero() {
        let records = vec![rec(3, 1, Some(9)), rec(9, 0, None), rec(4, 2, Some(3))];
        let stats = analyze(&records).unwrap();
        assert_eq!(stats.root_id, 9);
        assert_eq!(stats.root_children_count, 1);
    }

    #[test]
    fn rejects_missing_or_extra_roots() {
        assert_eq!(analyze(&[]), Err(AnalyzerError::MalformedHierarchy(Malformation::NoRoot)));

        let mut two = sample();
        two.push(rec(6, 0, None));
        assert_eq!(
            analyze(&two),
            Err(AnalyzerError::MalformedHierarchy(Malformation::MultipleRoots { ids: vec![0, 6] }))
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut records = sample();
        records.push(rec(2, 1, Some(0)));
        assert_eq!(
            analyze(&records),
            Err(AnalyzerError::MalformedHierarchy(Malformation::DuplicateId(2)))
        );
    }

    #[test]
    fn rejects_dangling_parent() {
        let mut records = sample();
        records.push(rec(6, 1, Some(42)));
        assert_eq!(
            analyze(&records),
            Err(AnalyzerError::MalformedHierarchy(Malformation::DanglingParent {
                id: 6,
                parent: 42
            }))
        );
    }

    #[test]
    fn rejects_detached_cycle() {
        let mut records = sample();
        records.push(rec(10, 1, Some(11)));
        records.push(rec(11, 2, Some(10)));
        assert_eq!(
            analyze(&records),
            Err(AnalyzerError::MalformedHierarchy(Malformation::Unreachable { id: 10 }))
        );
    }

    #[test]
    fn summary_lists_levels_in_order() {
        let text = analyze(&sample()).unwrap().to_string();
        assert!(text.contains("Total variants: 6"));
        assert!(text.contains("Tree depth (max level): 2"));
        assert!(text.contains("children of most common variant): 3"));
        let l0 = text.find("Level 0: 1 nodes").unwrap();
        let l2 = text.find("Level 2: 2 nodes").unwrap();
        assert!(l0 < l2);
    }
}
