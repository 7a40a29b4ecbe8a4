use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Process-variant analysis over an event log.
///
/// Extracts variants, keeps the ones covering most cases, and renders them
/// as a prefix trie, a flow graph and a similarity hierarchy.
#[derive(Parser, Debug)]
#[command(name = "varscope", version, about = "Process-variant analysis over an event log")]
pub struct CliArgs {
    /// Directory for CSV and JSON outputs
    #[arg(long, global = true, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Select the variants that cover the requested share of cases
    Select {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Build the prefix trie of the selected variants and write it as JSON
    Trie {
        #[command(flatten)]
        input: InputArgs,

        /// Use only the N most frequent selected variants (0 = all)
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Build the START/END flow graph of the selected variants and write it as JSON
    Flow {
        #[command(flatten)]
        input: InputArgs,

        /// Use only the N most frequent selected variants (0 = all)
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Build the similarity hierarchy and write it as CSV
    Hierarchy {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        shape: HierarchyArgs,
    },

    /// Print structural statistics of a hierarchy CSV
    Analyze {
        /// Hierarchy table (default: <output-dir>/variant_hierarchy_details.csv)
        csv: Option<PathBuf>,
    },

    /// Full pipeline: select, trie and flow JSON, hierarchy CSV, analysis
    Run {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        shape: HierarchyArgs,

        /// Rebuild the hierarchy even if the CSV already exists
        #[arg(long)]
        rebuild: bool,
    },
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Event log as JSON lines: {"case_id", "activity", "timestamp"}
    pub events: PathBuf,

    /// Share of cases the selected variants must cover, in (0, 1]
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Args, Debug, Default)]
pub struct HierarchyArgs {
    #[arg(long)]
    pub max_levels: Option<usize>,

    #[arg(long)]
    pub max_clusters: Option<usize>,

    #[arg(long)]
    pub min_cluster_size: Option<usize>,

    /// Use only the N most frequent selected variants (0 = all)
    #[arg(long)]
    pub top_n: Option<usize>,

    /// auto, agglomerative, kmeans or minibatch
    #[arg(long)]
    pub method: Option<String>,

    /// hashing, ollama or openai
    #[arg(long)]
    pub embedding_provider: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_overrides() {
        let args = CliArgs::try_parse_from([
            "varscope",
            "--output-dir",
            "out",
            "run",
            "events.jsonl",
            "--threshold",
            "0.9",
            "--max-clusters",
            "5",
            "--method",
            "kmeans",
            "--rebuild",
        ])
        .unwrap();

        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        match args.command {
            Command::Run { input, shape, rebuild } => {
                assert_eq!(input.events, PathBuf::from("events.jsonl"));
                assert_eq!(input.threshold, Some(0.9));
                assert_eq!(shape.max_clusters, Some(5));
                assert_eq!(shape.method.as_deref(), Some("kmeans"));
                assert!(rebuild);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn analyze_csv_is_optional() {
        let args = CliArgs::try_parse_from(["varscope", "analyze"]).unwrap();
        assert!(matches!(args.command, Command::Analyze { csv: None }));
    }

    #[test]
    fn events_path_is_required() {
        assert!(CliArgs::try_parse_from(["varscope", "select"]).is_err());
    }
}
