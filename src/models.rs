//! Data models for result aggregation.
//!
//! This module contains the core data structures shared by the locator,
//! the aggregators and the run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Layout of a per-repeat result file, decided once from its benchmark name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// `;`-delimited table preceded by a one-line banner.
    Tabular,
    /// `;`-delimited table without a banner.
    Startup,
    /// Free text with embedded numeric literals.
    Breakdown,
    /// Free text whose measurements follow a section marker.
    Networking,
}

impl FileKind {
    /// Classify a benchmark by its name.
    ///
    /// Precedence: "breakdown", then "net", then a "startup" prefix.
    pub fn classify(benchmark: &str) -> Self {
        if benchmark.contains("breakdown") {
            FileKind::Breakdown
        } else if benchmark.contains("net") {
            FileKind::Networking
        } else if benchmark.starts_with("startup") {
            FileKind::Startup
        } else {
            FileKind::Tabular
        }
    }

    /// Whether the first line is a banner echoed verbatim on output.
    pub fn has_banner(&self) -> bool {
        matches!(self, FileKind::Tabular)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Tabular => write!(f, "tabular"),
            FileKind::Startup => write!(f, "startup"),
            FileKind::Breakdown => write!(f, "breakdown"),
            FileKind::Networking => write!(f, "networking"),
        }
    }
}

/// A processing stage of a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Cell-by-cell averaging of tabular and startup results
    Tabular,
    /// Literal-by-literal averaging of breakdown reports
    Breakdown,
    /// Literal-by-literal averaging of networking sections
    Networking,
    /// Concatenation of per-data-structure map tables
    Map,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [Stage::Tabular, Stage::Breakdown, Stage::Networking, Stage::Map];

    /// Whether files of this kind are handled by this stage.
    pub fn handles(&self, kind: FileKind) -> bool {
        match self {
            Stage::Tabular => matches!(kind, FileKind::Tabular | FileKind::Startup),
            Stage::Breakdown => kind == FileKind::Breakdown,
            Stage::Networking => kind == FileKind::Networking,
            Stage::Map => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Tabular => write!(f, "tabular"),
            Stage::Breakdown => write!(f, "breakdown"),
            Stage::Networking => write!(f, "networking"),
            Stage::Map => write!(f, "map"),
        }
    }
}

/// Identity of a benchmark within one variant directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BenchmarkKey {
    /// Variant directory name.
    pub variant: String,
    /// File name with the repeat suffix removed.
    pub benchmark: String,
}

impl BenchmarkKey {
    pub fn new(variant: impl Into<String>, benchmark: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            benchmark: benchmark.into(),
        }
    }
}

impl fmt::Display for BenchmarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.variant, self.benchmark)
    }
}

/// Split `<stem>_<k>` into its stem and repeat index.
///
/// `k` must be a canonical decimal (no sign, no leading zero) in `1..=max_repeat`.
pub fn split_repeat_suffix(name: &str, max_repeat: usize) -> Option<(&str, usize)> {
    let (stem, suffix) = name.rsplit_once('_')?;
    if stem.is_empty() || suffix.is_empty() || suffix.starts_with('0') {
        return None;
    }
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let repeat: usize = suffix.parse().ok()?;
    (1..=max_repeat).contains(&repeat).then_some((stem, repeat))
}

/// One raw per-repeat result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatFile {
    pub path: PathBuf,
    pub repeat: usize,
}

/// All repeat files of one benchmark, ordered by repeat index.
#[derive(Debug, Clone)]
pub struct BenchmarkGroup {
    pub key: BenchmarkKey,
    pub kind: FileKind,
    /// Variant directory holding the repeats and the merged output.
    pub dir: PathBuf,
    pub repeats: Vec<RepeatFile>,
}

impl BenchmarkGroup {
    /// Path of the merged (suffix-less) output file.
    pub fn merged_path(&self) -> PathBuf {
        self.dir.join(&self.key.benchmark)
    }

    /// Repeat #1, the structural skeleton of the merged output.
    pub fn template(&self) -> Option<&RepeatFile> {
        self.repeats.iter().find(|r| r.repeat == 1)
    }

    /// Number of repeats actually present.
    pub fn observed(&self) -> usize {
        self.repeats.len()
    }
}

/// Result of one unit of work (a benchmark, a category or a map synthesis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UnitStatus {
    /// Outputs written from this many input files.
    Merged { outputs: Vec<PathBuf>, inputs: usize },
    /// Dry run: would be merged from this many input files.
    Planned { inputs: usize },
    /// The unit failed; siblings were still processed.
    Failed { error: String },
}

/// Outcome record for one unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub stage: Stage,
    pub variant: String,
    pub unit: String,
    #[serde(flatten)]
    pub status: UnitStatus,
}

impl UnitOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, UnitStatus::Failed { .. })
    }
}

/// Counts per outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub merged: usize,
    pub planned: usize,
    pub failed: usize,
    /// Units processed per stage.
    pub by_stage: std::collections::BTreeMap<Stage, usize>,
}

impl RunSummary {
    /// Creates a summary from a list of outcomes.
    pub fn from_outcomes(outcomes: &[UnitOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };

        for outcome in outcomes {
            match outcome.status {
                UnitStatus::Merged { .. } => summary.merged += 1,
                UnitStatus::Planned { .. } => summary.planned += 1,
                UnitStatus::Failed { .. } => summary.failed += 1,
            }
            *summary.by_stage.entry(outcome.stage).or_insert(0) += 1;
        }

        summary
    }
}

/// Metadata about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub results_root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub repeats: usize,
    pub stages: Vec<Stage>,
    pub dry_run: bool,
    pub duration_seconds: f64,
}

/// The complete record of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub outcomes: Vec<UnitOutcome>,
    pub summary: RunSummary,
}
