//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.anchor-results.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".anchor-results.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Result file discovery settings.
    #[serde(default)]
    pub locator: LocatorConfig,

    /// Networking result settings.
    #[serde(default)]
    pub networking: NetworkingConfig,

    /// Map table synthesis settings.
    #[serde(default)]
    pub map: MapConfig,

    /// Result gathering settings.
    #[serde(default)]
    pub gather: GatherConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding one subdirectory per library variant.
    #[serde(default = "default_results_root")]
    pub results_root: PathBuf,

    /// Number of repeats each benchmark was run.
    #[serde(default = "default_repeats")]
    pub repeats: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            results_root: default_results_root(),
            repeats: default_repeats(),
        }
    }
}

fn default_results_root() -> PathBuf {
    PathBuf::from("results")
}

fn default_repeats() -> usize {
    3
}

/// Result file discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Benchmark names that are never aggregated.
    #[serde(default = "default_excluded")]
    pub excluded: Vec<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            excluded: default_excluded(),
        }
    }
}

fn default_excluded() -> Vec<String> {
    vec!["startup_50000_10".to_string()]
}

/// Networking result settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkingConfig {
    /// Line separating connection noise from measurements.
    #[serde(default = "default_marker")]
    pub marker: String,
}

impl Default for NetworkingConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

fn default_marker() -> String {
    "Ended experiment\n".to_string()
}

/// Map table synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Variant directories whose name ends with this tag are synthesized.
    #[serde(default = "default_variant_tag")]
    pub variant_tag: String,

    /// Per-data-structure table name prefix.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    /// Per-data-structure table name suffix.
    #[serde(default = "default_table_suffix")]
    pub table_suffix: String,

    /// Extra name component of baseline (non-optimized) tables.
    #[serde(default = "default_baseline_marker")]
    pub baseline_marker: String,

    /// Data structures of the synthesized table, in output order.
    #[serde(default = "default_order")]
    pub order: Vec<String>,

    /// Data structures of the baseline interleave, in output order.
    #[serde(default = "default_baseline_order")]
    pub baseline_order: Vec<String>,

    /// Title line of the synthesized table.
    #[serde(default = "default_title")]
    pub title: String,

    /// Title line of the baseline interleave.
    #[serde(default = "default_baseline_title")]
    pub baseline_title: String,

    /// Column header line shared by both outputs.
    #[serde(default = "default_header")]
    pub header: String,

    /// Lines dropped from the top of each per-data-structure table.
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            variant_tag: default_variant_tag(),
            table_prefix: default_table_prefix(),
            table_suffix: default_table_suffix(),
            baseline_marker: default_baseline_marker(),
            order: default_order(),
            baseline_order: default_baseline_order(),
            title: default_title(),
            baseline_title: default_baseline_title(),
            header: default_header(),
            skip_rows: default_skip_rows(),
        }
    }
}

fn default_variant_tag() -> String {
    "scone".to_string()
}

fn default_table_prefix() -> String {
    "anchor_pmembench_map_".to_string()
}

fn default_table_suffix() -> String {
    "_result".to_string()
}

fn default_baseline_marker() -> String {
    "non_opt".to_string()
}

fn default_order() -> Vec<String> {
    vec!["ctree", "btree", "rtree", "rbtree", "hashmap_tx"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_baseline_order() -> Vec<String> {
    vec!["ctree", "btree", "rbtree"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_title() -> String {
    "map_custom: map_custom [15] [group: pmemobj]".to_string()
}

fn default_baseline_title() -> String {
    "map_custom: map_custom [18] [group: pmemobj]".to_string()
}

fn default_header() -> String {
    [
        "total-avg[sec]",
        "ops-per-second[1/sec]",
        "total-max[sec]",
        "total-min[sec]",
        "total-median[sec]",
        "total-std-dev[sec]",
        "latency-avg[nsec]",
        "latency-min[nsec]",
        "latency-max[nsec]",
        "latency-std-dev[nsec]",
        "latency-pctl-50.0%[nsec]",
        "latency-pctl-99.0%[nsec]",
        "latency-pctl-99.9%[nsec]",
        "threads",
        "ops-per-thread",
        "data-size",
        "seed",
        "repeats",
        "thread-affinity",
        "main-affinity",
        "min-exe-time",
        "total-ops",
        "type",
        "seed",
        "max-key",
        "external-tx",
        "alloc",
        "keys",
        "value-size",
        "read-ratio",
        "zipf-exp",
    ]
    .join(";")
}

fn default_skip_rows() -> usize {
    2
}

/// Result gathering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatherConfig {
    /// Trees copied into the results root before aggregation.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref root) = args.root {
            self.general.results_root = root.clone();
        }

        if let Some(repeats) = args.repeats {
            self.general.repeats = repeats;
        }

        if let Some(ref sources) = args.gather_from {
            self.gather.sources = sources.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
