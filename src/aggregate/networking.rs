//! Averaging of networking results.
//!
//! Networking runs log connection setup before a marker line; only the
//! section after the first marker carries measurements. The preamble is
//! dropped from the merged output.

use super::text::{TextTemplate, TokenSums};
use crate::error::{AggregateError, Result};
use crate::models::BenchmarkGroup;
use crate::output::{read_text, write_atomic};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Text after the first occurrence of `marker`.
pub fn measurement_section<'a>(text: &'a str, marker: &str, path: &Path) -> Result<&'a str> {
    text.split_once(marker)
        .map(|(_, section)| section)
        .ok_or_else(|| AggregateError::MissingMarker {
            path: path.to_path_buf(),
            marker: marker.to_string(),
        })
}

fn read_section(path: &Path, marker: &str) -> Result<TextTemplate> {
    let text = read_text(path)?;
    Ok(TextTemplate::parse(measurement_section(&text, marker, path)?))
}

/// Merge one networking category into a file named after the category.
pub fn aggregate(group: &BenchmarkGroup, marker: &str, expected_repeats: usize) -> Result<PathBuf> {
    let first = group.template().ok_or_else(|| AggregateError::MissingTemplate {
        key: group.key.clone(),
    })?;

    let template = read_section(&first.path, marker)?;
    debug!("{}: {} numeric literals after marker", group.key, template.slots());

    let mut sums = TokenSums::seed(group.key.clone(), template);
    for repeat in group.repeats.iter().filter(|r| r.repeat != 1) {
        sums.add(repeat.repeat, &read_section(&repeat.path, marker)?)?;
    }

    if sums.observed() < expected_repeats {
        warn!(
            "{}: only {} of {} repeats found, averaging over {}",
            group.key,
            sums.observed(),
            expected_repeats,
            sums.observed()
        );
    }

    let merged = group.merged_path();
    write_atomic(&merged, &sums.finish()?, Some(&first.path))?;
    Ok(merged)
}
