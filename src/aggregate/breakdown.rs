//! Averaging of free-text breakdown reports.
//!
//! Every numeric literal of a report is a structural position; the merged
//! report is repeat #1 with each literal replaced by the mean at its position.

use super::text::{TextTemplate, TokenSums};
use crate::error::{AggregateError, Result};
use crate::models::BenchmarkGroup;
use crate::output::{read_text, write_atomic};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Merge one breakdown benchmark into its suffix-less file.
pub fn aggregate(group: &BenchmarkGroup, expected_repeats: usize) -> Result<PathBuf> {
    let first = group.template().ok_or_else(|| AggregateError::MissingTemplate {
        key: group.key.clone(),
    })?;

    let template = TextTemplate::parse(&read_text(&first.path)?);
    debug!("{}: {} numeric literals", group.key, template.slots());

    let mut sums = TokenSums::seed(group.key.clone(), template);
    for repeat in group.repeats.iter().filter(|r| r.repeat != 1) {
        sums.add(repeat.repeat, &TextTemplate::parse(&read_text(&repeat.path)?))?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_support::write_repeats;
    use crate::models::FileKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_single_repeat_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let report = "=== anchor breakdown ===\n\
                      shortcut hit ratio: 0.42\n\
                      raw reads: 1534\n\
                      manifest ops: 12 (avg 3.25 us)\n\
                      tx log entries: 0\n";
        let group = write_repeats(temp_dir.path(), "anchor_breakdown", FileKind::Breakdown, &[report]);

        let merged = aggregate(&group, 1).unwrap();
        assert_eq!(std::fs::read_to_string(merged).unwrap(), report);
    }

    #[test]
    fn test_average_spliced_into_prose() {
        let temp_dir = TempDir::new().unwrap();
        let group = write_repeats(
            temp_dir.path(),
            "anchor_breakdown",
            FileKind::Breakdown,
            &[
                "hit ratio: 0.40\nreads: 10 | writes: 3.1\n",
                "hit ratio: 0.42\nreads: 20 | writes: 3.1\n",
                "hit ratio: 0.44\nreads: 30 | writes: 3.2\n",
            ],
        );

        let merged = aggregate(&group, 3).unwrap();
        assert_eq!(
            std::fs::read_to_string(merged).unwrap(),
            "hit ratio: 0.42\nreads: 20 | writes: 3.133333\n"
        );
    }

    #[test]
    fn test_token_count_mismatch_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let group = write_repeats(
            temp_dir.path(),
            "anchor_breakdown",
            FileKind::Breakdown,
            &["a 1 b 2\n", "a 1\n", "a 1 b 2\n"],
        );

        let err = aggregate(&group, 3).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::StructuralMismatch {
                repeat: 2,
                expected: 2,
                found: 1,
                ..
            }
        ));
        assert!(!group.merged_path().exists());
    }

    #[test]
    fn test_prose_mismatch_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let group = write_repeats(
            temp_dir.path(),
            "anchor_breakdown",
            FileKind::Breakdown,
            &["reads: 10\n", "writes: 30\n"],
        );

        let err = aggregate(&group, 2).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::TextMismatch {
                repeat: 2,
                segment: 0,
                ..
            }
        ));
        assert!(!group.merged_path().exists());
    }
}
