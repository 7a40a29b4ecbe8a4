use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::debug;

use varscope_core::{VariantCount, END, START};

/// Compressed control-flow view over a set of variants.
///
/// Nodes are deduplicated by activity label across all variants, so a label
/// shared by several variants is a single node. Edges are keyed by
/// `(source, target)` and carry the summed frequency of every variant that
/// traverses that adjacent pair, including the synthetic `START -> first`
/// and `last -> END` transitions. Repeated labels inside one variant yield
/// self-loops or back edges.
#[derive(Debug, Clone)]
pub struct VariantFlowGraph {
    nodes: IndexSet<String>,
    edges: IndexMap<(String, String), u64>,
}

/// A weighted edge, as exported to rendering collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

/// Serializable snapshot of the graph.
#[derive(Debug, Clone, Serialize)]
pub struct FlowGraphExport {
    pub nodes: Vec<String>,
    pub edges: Vec<FlowEdge>,
}

impl VariantFlowGraph {
    /// A graph holding only the `START` and `END` sentinels.
    pub fn new() -> Self {
        let mut nodes = IndexSet::new();
        nodes.insert(START.to_string());
        nodes.insert(END.to_string());
        Self {
            nodes,
            edges: IndexMap::new(),
        }
    }

    pub fn build(selected: &[VariantCount]) -> Self {
        let mut graph = Self::new();
        for entry in selected {
            graph.add_variant(entry.variant.activities(), entry.frequency);
        }
        debug!(
            variants = selected.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "variant flow graph built"
        );
        graph
    }

    /// Build from at most the first `top_n` variants (`None` = all).
    pub fn build_top_n(selected: &[VariantCount], top_n: Option<usize>) -> Self {
        let end = top_n.map_or(selected.len(), |n| n.min(selected.len()));
        Self::build(&selected[..end])
    }

    /// Accumulate one variant's frequency along its transitions.
    pub fn add_variant(&mut self, activities: &[String], frequency: u64) {
        let mut prev = START;
        for activity in activities {
            self.nodes.insert(activity.clone());
            self.accumulate(prev, activity, frequency);
            prev = activity;
        }
        self.accumulate(prev, END, frequency);
    }

    fn accumulate(&mut self, source: &str, target: &str, frequency: u64) {
        *self
            .edges
            .entry((source.to_string(), target.to_string()))
            .or_insert(0) += frequency;
    }

    pub fn contains_node(&self, label: &str) -> bool {
        self.nodes.contains(label)
    }

    /// Node labels, sentinels first, then activities in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// `(source, target, weight)` in first-traversal order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.edges
            .iter()
            .map(|((s, t), &w)| (s.as_str(), t.as_str(), w))
    }

    /// Weight of `source -> target`, 0 when the edge does not exist.
    pub fn weight(&self, source: &str, target: &str) -> u64 {
        self.edges
            .get(&(source.to_string(), target.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Total weight leaving `label`.
    pub fn outgoing_weight(&self, label: &str) -> u64 {
        self.edges().filter(|(s, _, _)| *s == label).map(|(_, _, w)| w).sum()
    }

    /// Total weight entering `label`.
    pub fn incoming_weight(&self, label: &str) -> u64 {
        self.edges().filter(|(_, t, _)| *t == label).map(|(_, _, w)| w).sum()
    }

    /// Direct successors of `label` with edge weights, heaviest first.
    pub fn successors(&self, label: &str) -> Vec<(&str, u64)> {
        let mut out: Vec<(&str, u64)> = self
            .edges()
            .filter(|(s, _, _)| *s == label)
            .map(|(_, t, w)| (t, w))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out
    }

    pub fn export(&self) -> FlowGraphExport {
        FlowGraphExport {
            nodes: self.nodes.iter().cloned().collect(),
            edges: self
                .edges()
                .map(|(source, target, weight)| FlowEdge {
                    source: source.to_string(),
                    target: target.to_string(),
                    weight,
                })
                .collect(),
        }
    }
}

impl Default for VariantFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varscope_core::Variant;

    fn vc(steps: &[&str], freq: u64) -> VariantCount {
        VariantCount::new(Variant::from(steps), freq)
    }

    #[test]
    fn scenario_edges() {
        let g = VariantFlowGraph::build(&[vc(&["A", "B", "C"], 100), vc(&["A", "B", "D"], 50)]);

        assert_eq!(g.weight("START", "A"), 150);
        assert_eq!(g.weight("A", "B"), 150);
        assert_eq!(g.weight("B", "C"), 100);
        assert_eq!(g.weight("B", "D"), 50);
        assert_eq!(g.weight("C", "END"), 100);
        assert_eq!(g.weight("D", "END"), 50);
        assert_eq!(g.edge_count(), 6);
        assert_eq!(g.node_count(), 6);
    }

    #[test]
    fn nodes_are_shared_across_variants() {
        let g = VariantFlowGraph::build(&[vc(&["A", "X", "C"], 3), vc(&["B", "X", "D"], 4)]);
        // X appears in both variants but once in the graph.
        assert_eq!(g.nodes().filter(|n| *n == "X").count(), 1);
        assert_eq!(g.incoming_weight("X"), 7);
        assert_eq!(g.outgoing_weight("X"), 7);
    }

    #[test]
    fn empty_variant_is_start_to_end() {
        let g = VariantFlowGraph::build(&[vc(&[], 9)]);
        assert_eq!(g.weight("START", "END"), 9);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn empty_input_has_only_sentinels() {
        let g = VariantFlowGraph::build(&[]);
        assert!(g.contains_node("START"));
        assert!(g.contains_node("END"));
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.weight("START", "END"), 0);
    }

    #[test]
    fn repeated_activity_creates_self_loop_and_back_edge() {
        let g = VariantFlowGraph::build(&[vc(&["A", "A", "B", "A"], 2)]);
        assert_eq!(g.weight("A", "A"), 2);
        assert_eq!(g.weight("A", "B"), 2);
        assert_eq!(g.weight("B", "A"), 2);
        assert_eq!(g.weight("A", "END"), 2);
        assert_eq!(g.node_count(), 4);
    }

    #[test]
    fn start_and_end_totals_match_input() {
        let input = vec![vc(&["A", "B"], 5), vc(&["C"], 2), vc(&["A"], 1)];
        let g = VariantFlowGraph::build(&input);
        assert_eq!(g.outgoing_weight("START"), 8);
        assert_eq!(g.incoming_weight("END"), 8);
    }

    #[test]
    fn split_frequency_is_additive() {
        let mut split = VariantFlowGraph::new();
        let steps: Vec<String> = vec!["A".into(), "B".into()];
        split.add_variant(&steps, 2);
        split.add_variant(&steps, 3);
        let whole = VariantFlowGraph::build(&[vc(&["A", "B"], 5)]);
        assert_eq!(split.export().edges, whole.export().edges);
    }

    #[test]
    fn successors_heaviest_first() {
        let g = VariantFlowGraph::build(&[vc(&["A", "C"], 1), vc(&["A", "B"], 5)]);
        assert_eq!(g.successors("A"), vec![("B", 5), ("C", 1)]);
    }

    #[test]
    fn build_top_n_uses_prefix() {
        let input = vec![vc(&["A"], 5), vc(&["B"], 3)];
        let g = VariantFlowGraph::build_top_n(&input, Some(1));
        assert!(!g.contains_node("B"));
    }
}
