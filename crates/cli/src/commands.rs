use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use varscope_compute::export::{load_hierarchy_csv, save_hierarchy_csv, save_selected_csv};
use varscope_compute::{
    analyze, extract_variants, select, ClusterMethod, ClusteringStrategy, CoverageSummary,
    HierarchyConfig, HierarchyStats, SimilarityHierarchyBuilder, VariantFlowGraph, VariantTrie,
};
use varscope_core::{total_frequency, Config, VariantCount};
use varscope_ingest::read_events;

use crate::cli::{HierarchyArgs, InputArgs};
use crate::embedder::build_embedder;

/// Fold command-line overrides into the env-derived config.
pub fn apply_overrides(
    config: &mut Config,
    input: Option<&InputArgs>,
    shape: Option<&HierarchyArgs>,
) {
    if let Some(t) = input.and_then(|i| i.threshold) {
        config.coverage.threshold = t;
    }
    let Some(shape) = shape else { return };
    if let Some(v) = shape.max_levels {
        config.hierarchy.max_levels = v;
    }
    if let Some(v) = shape.max_clusters {
        config.hierarchy.max_clusters = v;
    }
    if let Some(v) = shape.min_cluster_size {
        config.hierarchy.min_cluster_size = v;
    }
    if let Some(v) = shape.top_n {
        config.hierarchy.top_n = v;
    }
    if let Some(v) = &shape.method {
        config.clustering.method = v.clone();
    }
    if let Some(v) = &shape.embedding_provider {
        config.embedding.provider = v.clone();
    }
}

/// Read the event log, extract variants and apply the coverage cutoff.
pub fn selected_variants(config: &Config, events: &Path) -> Result<Vec<VariantCount>> {
    let events = read_events(events)
        .with_context(|| format!("failed to read event log {}", events.display()))?;
    let variants = extract_variants(&events);
    let total = total_frequency(&variants);

    let selected = select(&variants, total, config.coverage.threshold)
        .context("coverage selection failed")?;
    let summary = CoverageSummary::of(&selected, total);
    info!(
        events = events.len(),
        variants = variants.len(),
        selected = summary.selected,
        covered = summary.covered_cases,
        total = summary.total_cases,
        fraction = summary.covered_fraction,
        "variants selected"
    );
    Ok(selected)
}

pub fn run_select(config: &Config, selected: &[VariantCount]) -> Result<()> {
    let path = config.output.selected_csv();
    save_selected_csv(&path, selected)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Selected {} variants -> {}", selected.len(), path.display());
    if let Some(line) = happy_path(selected) {
        println!("{line}");
    }
    Ok(())
}

/// The most frequent variant, rendered as `A → B → C` with its length and case count.
pub fn happy_path(selected: &[VariantCount]) -> Option<String> {
    let top = selected.first()?;
    info!(
        events = top.variant.len(),
        cases = top.frequency,
        path = %top.variant,
        "happy path"
    );
    Some(format!(
        "Happy path ({} events, {} cases): {}",
        top.variant.len(),
        top.frequency,
        top.variant
    ))
}

pub fn run_trie(config: &Config, selected: &[VariantCount], top_n: usize) -> Result<()> {
    let trie = VariantTrie::build_top_n(selected, limit(top_n));
    let path = config.output.trie_json();
    write_json(&path, &trie.export())?;
    println!(
        "Trie: {} nodes, depth {} -> {}",
        trie.len(),
        trie.max_depth(),
        path.display()
    );
    Ok(())
}

pub fn run_flow(config: &Config, selected: &[VariantCount], top_n: usize) -> Result<()> {
    let graph = VariantFlowGraph::build_top_n(selected, limit(top_n));
    let path = config.output.flow_json();
    write_json(&path, &graph.export())?;
    println!(
        "Flow graph: {} nodes, {} edges -> {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(())
}

pub async fn run_hierarchy(config: &Config, selected: &[VariantCount]) -> Result<()> {
    let subset = match limit(config.hierarchy.top_n) {
        Some(n) => &selected[..n.min(selected.len())],
        None => selected,
    };

    let embedder =
        build_embedder(&config.embedding).context("failed to create embedding provider")?;
    let builder =
        SimilarityHierarchyBuilder::new(hierarchy_config(config), clustering_strategy(config)?);
    let tree = builder
        .build(subset, embedder.as_ref())
        .await
        .context("hierarchy construction failed")?;

    let path = config.output.hierarchy_csv();
    save_hierarchy_csv(&path, &tree.to_records())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "Hierarchy: {} nodes, max level {} -> {}",
        tree.len(),
        tree.max_level(),
        path.display()
    );
    Ok(())
}

pub fn run_analyze(path: &Path) -> Result<HierarchyStats> {
    let records = load_hierarchy_csv(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let stats = analyze(&records).with_context(|| format!("cannot analyze {}", path.display()))?;
    println!("{stats}");
    Ok(stats)
}

/// select -> trie / flow JSON -> hierarchy CSV (unless present) -> analyze.
pub async fn run_pipeline(config: &Config, events: &Path, rebuild: bool) -> Result<HierarchyStats> {
    let selected = selected_variants(config, events)?;
    run_select(config, &selected)?;
    run_trie(config, &selected, config.coverage.graph_top_n)?;
    run_flow(config, &selected, config.coverage.graph_top_n)?;

    let csv = config.output.hierarchy_csv();
    if rebuild || !csv.exists() {
        if !csv.exists() {
            warn!(path = %csv.display(), "hierarchy table not found, building it now");
        }
        run_hierarchy(config, &selected).await?;
    } else {
        info!(path = %csv.display(), "reusing existing hierarchy table");
    }

    run_analyze(&csv)
}

fn hierarchy_config(config: &Config) -> HierarchyConfig {
    HierarchyConfig {
        max_levels: config.hierarchy.max_levels,
        max_clusters: config.hierarchy.max_clusters,
        min_cluster_size: config.hierarchy.min_cluster_size,
        embed_batch_size: config.embedding.batch_size,
    }
}

fn clustering_strategy(config: &Config) -> Result<ClusteringStrategy> {
    let method = config
        .clustering
        .method
        .parse::<ClusterMethod>()
        .context("invalid CLUSTER_METHOD")?;
    Ok(ClusteringStrategy {
        method,
        switchover: config.clustering.switchover,
        batch_size: config.clustering.batch_size,
        max_iterations: config.clustering.max_iterations,
        seed: config.clustering.seed,
    })
}

fn limit(top_n: usize) -> Option<usize> {
    (top_n > 0).then_some(top_n)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_log(path: &Path) {
        let mut file = fs::File::create(path).unwrap();
        let shapes: [(&[&str], usize); 3] = [
            (&["A", "B", "C"], 100),
            (&["A", "B", "D"], 50),
            (&["A", "E"], 10),
        ];
        let mut case = 0;
        for (activities, count) in shapes {
            for _ in 0..count {
                for (step, activity) in activities.iter().enumerate() {
                    writeln!(
                        file,
                        r#"{{"case_id":"c{case}","activity":"{activity}","timestamp":"{}"}}"#,
                        format!("2024-01-01T00:{:02}:{:02}Z", step, case % 60)
                    )
                    .unwrap();
                }
                case += 1;
            }
        }
    }

    fn test_config(dir: &Path) -> Config {
        let mut config = Config::for_profile("").unwrap();
        config.output.dir = dir.join("output");
        config.coverage.threshold = 1.0;
        config.embedding.provider = "hashing".into();
        config.embedding.dimensions = 16;
        config.clustering.method = "auto".into();
        config
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = Config::for_profile("").unwrap();
        let input = InputArgs {
            events: "e.jsonl".into(),
            threshold: Some(0.5),
        };
        let shape = HierarchyArgs {
            max_clusters: Some(3),
            method: Some("kmeans".into()),
            ..Default::default()
        };
        apply_overrides(&mut config, Some(&input), Some(&shape));
        assert_eq!(config.coverage.threshold, 0.5);
        assert_eq!(config.hierarchy.max_clusters, 3);
        assert_eq!(config.clustering.method, "kmeans");
    }

    #[test]
    fn unknown_cluster_method_fails() {
        let mut config = Config::for_profile("").unwrap();
        config.clustering.method = "spectral".into();
        assert!(clustering_strategy(&config).is_err());
    }

    #[test]
    fn happy_path_is_the_first_selected_variant() {
        let selected = vec![
            VariantCount::new(varscope_core::Variant::new(["A", "B", "C"]), 100),
            VariantCount::new(varscope_core::Variant::new(["A", "E"]), 10),
        ];
        assert_eq!(
            happy_path(&selected).as_deref(),
            Some("Happy path (3 events, 100 cases): A → B → C")
        );
        assert_eq!(happy_path(&[]), None);
    }

    #[tokio::test]
    async fn pipeline_writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("events.jsonl");
        write_log(&log);
        let config = test_config(dir.path());

        let stats = run_pipeline(&config, &log, false).await.unwrap();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.level_counts.values().sum::<usize>(), 3);

        assert!(config.output.selected_csv().exists());
        assert!(config.output.trie_json().exists());
        assert!(config.output.hierarchy_csv().exists());

        let flow: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(config.output.flow_json()).unwrap()).unwrap();
        let edges = flow["edges"].as_array().unwrap();
        let start_a = edges
            .iter()
            .find(|e| e["source"] == "START" && e["target"] == "A")
            .unwrap();
        assert_eq!(start_a["weight"], 160);
    }

    #[tokio::test]
    async fn pipeline_reuses_existing_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("events.jsonl");
        write_log(&log);
        let config = test_config(dir.path());

        run_pipeline(&config, &log, false).await.unwrap();
        let csv = config.output.hierarchy_csv();
        let first = fs::read_to_string(&csv).unwrap();

        // A second run with a different shape must not touch the table.
        let mut changed = config.clone();
        changed.hierarchy.max_levels = 0;
        run_pipeline(&changed, &log, false).await.unwrap();
        assert_eq!(fs::read_to_string(&csv).unwrap(), first);
    }
}
