mod builder;
mod table;
mod types;

pub use builder::SimilarityHierarchyBuilder;
pub use table::HierarchyRecord;
pub use types::*;
