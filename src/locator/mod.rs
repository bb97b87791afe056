//! Result locator for discovering repeat files.
//!
//! This module enumerates variant directories under a results root and
//! groups their per-repeat files into benchmarks for each stage.

use crate::error::{AggregateError, Result};
use crate::models::{split_repeat_suffix, BenchmarkGroup, BenchmarkKey, FileKind, RepeatFile, Stage};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration for result discovery.
#[derive(Debug, Clone)]
pub struct LocateConfig {
    /// Highest repeat suffix accepted.
    pub repeats: usize,
    /// Benchmark names never aggregated.
    pub excluded: Vec<String>,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            repeats: 3,
            excluded: vec!["startup_50000_10".to_string()],
        }
    }
}

impl LocateConfig {
    pub fn new(repeats: usize, config: &crate::config::LocatorConfig) -> Self {
        Self {
            repeats,
            excluded: config.excluded.clone(),
        }
    }
}

/// A variant directory under the results root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDir {
    pub name: String,
    pub path: PathBuf,
}

/// Locator over one results root.
pub struct ResultLocator {
    config: LocateConfig,
    root: PathBuf,
}

impl ResultLocator {
    /// Create a new locator.
    pub fn new(root: PathBuf, config: LocateConfig) -> Self {
        Self { config, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List variant directories, sorted by name.
    pub fn variant_dirs(&self) -> Result<Vec<VariantDir>> {
        let entries = fs::read_dir(&self.root).map_err(|e| AggregateError::io(&self.root, e))?;

        let mut dirs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if name.starts_with('.') || !path.is_dir() {
                continue;
            }

            dirs.push(VariantDir { name, path });
        }

        dirs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(dirs)
    }

    /// Group the repeat files of `variant` handled by `stage`, sorted by benchmark name.
    pub fn locate(&self, variant: &VariantDir, stage: Stage) -> Result<Vec<BenchmarkGroup>> {
        let names = list_file_names(&variant.path)?;
        let mut groups: BTreeMap<BenchmarkKey, BenchmarkGroup> = BTreeMap::new();

        for name in &names {
            let Some((stem, repeat)) = split_repeat_suffix(name, self.config.repeats) else {
                continue;
            };

            if self.is_excluded(stem) {
                debug!("Skipping excluded benchmark {}", name);
                continue;
            }

            let kind = FileKind::classify(stem);
            if !stage.handles(kind) {
                continue;
            }

            let key = BenchmarkKey::new(&variant.name, stem);
            groups
                .entry(key.clone())
                .or_insert_with(|| BenchmarkGroup {
                    key,
                    kind,
                    dir: variant.path.clone(),
                    repeats: Vec::new(),
                })
                .repeats
                .push(RepeatFile {
                    path: variant.path.join(name),
                    repeat,
                });
        }

        // A merged output named like a repeat of a shorter stem
        // (`net_echo_1` beside `net_echo_1_1`) belongs to the longer one.
        let stems: HashSet<String> = groups.keys().map(|k| k.benchmark.clone()).collect();
        for group in groups.values_mut() {
            group.repeats.retain(|r| {
                let name = r.path.file_name().map(|n| n.to_string_lossy().to_string());
                match name {
                    Some(name) if stems.contains(&name) => {
                        warn!(
                            "Treating {} as a merged output, not a repeat of {}",
                            name, group.key.benchmark
                        );
                        false
                    }
                    _ => true,
                }
            });
            group.repeats.sort_by_key(|r| r.repeat);
        }

        Ok(groups
            .into_values()
            .filter(|g| !g.repeats.is_empty())
            .collect())
    }

    /// Delete the merged output of `group` left over from an earlier run.
    pub fn purge_stale(&self, group: &BenchmarkGroup) -> Result<()> {
        let merged = group.merged_path();
        if crate::output::remove_stale(&merged)? {
            debug!("Removed stale merge {}", merged.display());
        }
        Ok(())
    }

    /// Check if a benchmark name is a configured sentinel.
    fn is_excluded(&self, stem: &str) -> bool {
        self.config.excluded.iter().any(|e| e == stem)
    }
}

/// Regular, non-hidden file names in `dir`, sorted.
pub fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| AggregateError::io(dir, e))?;

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| !name.starts_with('.'))
        .collect();

    names.sort();
    Ok(names)
}
