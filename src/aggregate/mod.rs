//! Aggregators that merge repeat files into one averaged file.
//!
//! All of them designate repeat #1 as the template, sum the values at each
//! structural position over the repeats present, and write the mean back
//! into the template's layout.

pub mod breakdown;
pub mod format;
pub mod networking;
pub mod tabular;
pub mod text;

use crate::error::Result;
use crate::models::{BenchmarkGroup, FileKind};
use std::path::PathBuf;

/// Settings shared by the per-benchmark aggregators.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Configured repeat count; fewer observed repeats only warn.
    pub repeats: usize,
    /// Networking section delimiter.
    pub marker: String,
}

/// Merge `group` with the aggregator for its kind.
pub fn aggregate(group: &BenchmarkGroup, options: &AggregateOptions) -> Result<PathBuf> {
    match group.kind {
        FileKind::Tabular | FileKind::Startup => tabular::aggregate(group, options.repeats),
        FileKind::Breakdown => breakdown::aggregate(group, options.repeats),
        FileKind::Networking => networking::aggregate(group, &options.marker, options.repeats),
    }
}
