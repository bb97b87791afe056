//! Run summary generation.
//!
//! This module renders the outcome of a run as Markdown or JSON.

use crate::models::{RunMetadata, RunReport, RunSummary, UnitOutcome, UnitStatus};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown summary.
pub fn generate_markdown_report(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str("# Anchor Results Summary\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_failures_section(&report.outcomes));
    output.push_str(&generate_outputs_section(&report.outcomes));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &RunMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Results Root:** `{}`\n",
        metadata.results_root.display()
    ));
    section.push_str(&format!(
        "- **Started:** {}\n",
        metadata.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Repeats:** {}\n", metadata.repeats));
    let stages: Vec<String> = metadata.stages.iter().map(|s| s.to_string()).collect();
    section.push_str(&format!("- **Stages:** {}\n", stages.join(", ")));
    if metadata.dry_run {
        section.push_str("- **Dry Run:** yes\n");
    }
    section.push_str(&format!("- **Duration:** {:.1}s\n", metadata.duration_seconds));
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &RunSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Stage | Units |\n");
    section.push_str("|-------|-------|\n");
    for (stage, count) in &summary.by_stage {
        section.push_str(&format!("| {} | {} |\n", stage, count));
    }
    section.push('\n');

    section.push_str(&format!(
        "**Total:** {} | **Merged:** {} | **Planned:** {} | **Failed:** {}\n\n",
        summary.total, summary.merged, summary.planned, summary.failed
    ));

    section
}

/// Generate the failures section; empty when nothing failed.
fn generate_failures_section(outcomes: &[UnitOutcome]) -> String {
    let failures: Vec<(&UnitOutcome, &str)> = outcomes
        .iter()
        .filter_map(|o| match &o.status {
            UnitStatus::Failed { error } => Some((o, error.as_str())),
            _ => None,
        })
        .collect();

    if failures.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Failures\n\n");
    for (outcome, error) in failures {
        section.push_str(&format!(
            "- **{}** `{}/{}`: {}\n",
            outcome.stage, outcome.variant, outcome.unit, error
        ));
    }
    section.push('\n');

    section
}

fn generate_outputs_section(outcomes: &[UnitOutcome]) -> String {
    let mut section = String::new();

    section.push_str("## Outputs\n\n");
    for outcome in outcomes {
        match &outcome.status {
            UnitStatus::Merged { outputs, inputs } => {
                for output in outputs {
                    section.push_str(&format!(
                        "- `{}` ({} inputs)\n",
                        output.display(),
                        inputs
                    ));
                }
            }
            UnitStatus::Planned { inputs } => {
                section.push_str(&format!(
                    "- `{}/{}` (planned, {} inputs)\n",
                    outcome.variant, outcome.unit, inputs
                ));
            }
            UnitStatus::Failed { .. } => {}
        }
    }
    section.push('\n');

    section
}

/// Generate a JSON summary.
pub fn generate_json_report(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a rendered summary to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write summary to {}", path.display()))
}
