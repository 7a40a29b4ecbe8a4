pub mod algorithms;
pub mod export;

pub use algorithms::analyzer::{analyze, AnalyzerError, HierarchyStats, Malformation};
pub use algorithms::clustering::{ClusterMethod, Clusterer, ClusteringError, ClusteringStrategy};
pub use algorithms::coverage::{select, CoverageError, CoverageSummary};
pub use algorithms::flow_graph::VariantFlowGraph;
pub use algorithms::hierarchy::{
    HierarchyConfig, HierarchyError, HierarchyNode, HierarchyRecord, HierarchyTree,
    SimilarityHierarchyBuilder,
};
pub use algorithms::trie::VariantTrie;
pub use algorithms::variants::extract_variants;
pub use export::TableError;
