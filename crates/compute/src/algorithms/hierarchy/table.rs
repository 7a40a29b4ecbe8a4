use serde::{Deserialize, Serialize};

use super::types::{HierarchyNodeId, HierarchyTree};

/// One row of the flattened hierarchy table.
///
/// This is the persisted shape: the variant itself is kept only as its
/// display path, and `parent` is `None` for the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyRecord {
    pub id: HierarchyNodeId,
    pub level: usize,
    pub frequency: u64,
    pub parent: Option<HierarchyNodeId>,
    pub path: String,
}

impl HierarchyTree {
    /// Flatten the tree into table rows, in node creation order.
    pub fn to_records(&self) -> Vec<HierarchyRecord> {
        self.nodes()
            .iter()
            .map(|node| HierarchyRecord {
                id: node.id,
                level: node.level,
                frequency: node.frequency,
                parent: node.parent,
                path: node.variant.to_path(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use varscope_core::Variant;

    use super::super::types::HierarchyNode;
    use super::*;

    #[test]
    fn records_follow_creation_order() {
        let tree = HierarchyTree::from_nodes(vec![
            HierarchyNode {
                id: 0,
                variant: Variant::new(["A", "B"]),
                frequency: 9,
                parent: None,
                level: 0,
            },
            HierarchyNode {
                id: 1,
                variant: Variant::new(["A", "C"]),
                frequency: 4,
                parent: Some(0),
                level: 1,
            },
        ]);

        let records = tree.to_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].parent, None);
        assert_eq!(records[0].path, "A → B");
        assert_eq!(records[1].id, 1);
        assert_eq!(records[1].parent, Some(0));
        assert_eq!(records[1].level, 1);
        assert_eq!(records[1].frequency, 4);
    }
}
