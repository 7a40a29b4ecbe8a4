pub mod agglomerative;
pub mod analyzer;
pub mod clustering;
pub mod coverage;
pub mod flow_graph;
pub mod hierarchy;
pub mod kmeans;
pub mod minibatch_kmeans;
pub mod trie;
pub mod variants;
