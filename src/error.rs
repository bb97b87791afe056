//! Faults raised while aggregating a single unit of work.
//!
//! Each variant is fatal for the benchmark, category or variant directory
//! that raised it and for nothing else; the pipeline records it and moves on.

use crate::models::BenchmarkKey;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    /// Repeats of one benchmark disagree on their structural positions.
    #[error("structural mismatch in {key}: repeat {repeat} has {found} {unit}, template has {expected}")]
    StructuralMismatch {
        key: BenchmarkKey,
        repeat: usize,
        expected: usize,
        found: usize,
        unit: &'static str,
    },

    /// Repeats of one benchmark disagree on the text around their numbers.
    #[error("structural mismatch in {key}: repeat {repeat} has {found:?} at text segment {segment}, template has {expected:?}")]
    TextMismatch {
        key: BenchmarkKey,
        repeat: usize,
        segment: usize,
        expected: String,
        found: String,
    },

    #[error("section marker {marker:?} not found in {}", path.display())]
    MissingMarker { path: PathBuf, marker: String },

    #[error("missing input for variant {variant}: {}", path.display())]
    MissingInput { variant: String, path: PathBuf },

    #[error("{key} has no repeat 1 to use as template")]
    MissingTemplate { key: BenchmarkKey },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed table {}: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, AggregateError>;

impl AggregateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AggregateError::Io {
            path: path.into(),
            source,
        }
    }
}
