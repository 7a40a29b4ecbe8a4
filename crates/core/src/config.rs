use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VarscopeError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
/// Returns the name of the variable that matched along with its value.
fn profiled_env_entry(profile: &str, key: &str) -> Option<(String, String)> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some((prefixed, v));
        }
    }
    env_opt(key).map(|v| (key.to_string(), v))
}

fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    profiled_env_entry(profile, key).map(|(_, v)| v)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse a profiled env var, or fall back to `default` when it is unset.
/// A value that is set but does not parse is an error.
fn profiled_env_parse<T: FromStr>(
    profile: &str,
    key: &str,
    default: T,
) -> Result<T, VarscopeError> {
    match profiled_env_entry(profile, key) {
        None => Ok(default),
        Some((key, value)) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|_| VarscopeError::InvalidConfig { key, value })
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub coverage: CoverageConfig,
    pub hierarchy: HierarchyConfig,
    pub clustering: ClusteringConfig,
    pub embedding: EmbeddingConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `VARSCOPE_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, VarscopeError> {
        let profile = env_or("VARSCOPE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    /// Fails on the first numeric key whose value does not parse.
    pub fn for_profile(profile: &str) -> Result<Self, VarscopeError> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            coverage: CoverageConfig::from_env_profiled(p)?,
            hierarchy: HierarchyConfig::from_env_profiled(p)?,
            clustering: ClusteringConfig::from_env_profiled(p)?,
            embedding: EmbeddingConfig::from_env_profiled(p)?,
            output: OutputConfig::from_env_profiled(p),
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  coverage:    threshold={}, graph_top_n={}",
            self.coverage.threshold,
            self.coverage.graph_top_n
        );
        tracing::info!(
            "  hierarchy:   max_levels={}, max_clusters={}, min_cluster_size={}",
            self.hierarchy.max_levels,
            self.hierarchy.max_clusters,
            self.hierarchy.min_cluster_size
        );
        tracing::info!(
            "  clustering:  method={}, switchover={}, batch_size={}, seed={}",
            self.clustering.method,
            self.clustering.switchover,
            self.clustering.batch_size,
            self.clustering.seed
        );
        tracing::info!(
            "  embedding:   provider={}, dimensions={}, configured={}",
            self.embedding.provider,
            self.embedding.dimensions,
            self.embedding.is_configured()
        );
        tracing::info!("  output:      dir={}", self.output.dir.display());
    }
}

// ── Coverage ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Fraction of cases the selected variants must cover, in (0, 1].
    pub threshold: f64,
    /// How many selected variants feed the trie and flow graph (0 = all).
    pub graph_top_n: usize,
}

impl CoverageConfig {
    fn from_env_profiled(p: &str) -> Result<Self, VarscopeError> {
        Ok(Self {
            threshold: profiled_env_parse(p, "COVERAGE_THRESHOLD", 0.8)?,
            graph_top_n: profiled_env_parse(p, "GRAPH_TOP_N", 50)?,
        })
    }
}

// ── Hierarchy ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub max_levels: usize,
    pub max_clusters: usize,
    pub min_cluster_size: usize,
    /// How many selected variants feed the hierarchy (0 = all).
    pub top_n: usize,
}

impl HierarchyConfig {
    fn from_env_profiled(p: &str) -> Result<Self, VarscopeError> {
        Ok(Self {
            max_levels: profiled_env_parse(p, "HIERARCHY_MAX_LEVELS", 10)?,
            max_clusters: profiled_env_parse(p, "HIERARCHY_MAX_CLUSTERS", 20)?,
            min_cluster_size: profiled_env_parse(p, "HIERARCHY_MIN_CLUSTER_SIZE", 2)?,
            top_n: profiled_env_parse(p, "HIERARCHY_TOP_N", 0)?,
        })
    }
}

// ── Clustering ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// "auto", "agglomerative", "kmeans", "minibatch"
    pub method: String,
    /// Pools strictly larger than this use mini-batch k-means under "auto".
    pub switchover: usize,
    pub batch_size: usize,
    pub max_iterations: usize,
    pub seed: u64,
}

impl ClusteringConfig {
    fn from_env_profiled(p: &str) -> Result<Self, VarscopeError> {
        Ok(Self {
            method: profiled_env_or(p, "CLUSTER_METHOD", "auto"),
            switchover: profiled_env_parse(p, "CLUSTER_SWITCHOVER", 1000)?,
            batch_size: profiled_env_parse(p, "CLUSTER_BATCH_SIZE", 1000)?,
            max_iterations: profiled_env_parse(p, "CLUSTER_MAX_ITERATIONS", 100)?,
            seed: profiled_env_parse(p, "CLUSTER_SEED", 42)?,
        })
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "hashing", "ollama", "openai"
    pub provider: String,
    pub dimensions: usize,
    pub batch_size: usize,
    pub cache_capacity: usize,
    pub ollama_url: String,
    pub ollama_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
}

impl EmbeddingConfig {
    fn from_env_profiled(p: &str) -> Result<Self, VarscopeError> {
        Ok(Self {
            provider: profiled_env_or(p, "EMBEDDING_PROVIDER", "hashing"),
            dimensions: profiled_env_parse(p, "EMBEDDING_DIMENSIONS", 384)?,
            batch_size: profiled_env_parse(p, "EMBEDDING_BATCH_SIZE", 64)?,
            cache_capacity: profiled_env_parse(p, "EMBEDDING_CACHE_CAPACITY", 10_000)?,
            ollama_url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            ollama_model: profiled_env_or(p, "OLLAMA_EMBEDDING_MODEL", "all-minilm"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_EMBEDDING_MODEL", "text-embedding-3-small"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
        })
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" | "hashing" => true,
            _ => false,
        }
    }
}

// ── Output ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl OutputConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dir: PathBuf::from(profiled_env_or(p, "OUTPUT_DIR", "output")),
        }
    }

    pub fn hierarchy_csv(&self) -> PathBuf {
        self.dir.join("variant_hierarchy_details.csv")
    }

    pub fn selected_csv(&self) -> PathBuf {
        self.dir.join("pareto_variants.csv")
    }

    pub fn trie_json(&self) -> PathBuf {
        self.dir.join("variant_trie.json")
    }

    pub fn flow_json(&self) -> PathBuf {
        self.dir.join("variant_flow.json")
    }
}
