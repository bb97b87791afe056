//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Stage;
use clap::Parser;
use std::path::PathBuf;

/// anchor-results - average repeated Anchor benchmark runs
///
/// Walks a results root holding one directory per library variant, merges
/// every `<benchmark>_<k>` repeat set into `<benchmark>` and synthesizes
/// the combined map tables consumed by the plotting scripts.
///
/// Examples:
///   anchor-results ./results
///   anchor-results ./results --repeats 5 --stages tabular,map
///   anchor-results --gather-from ../../results,../../scone/results
///   anchor-results ./results --dry-run
///   anchor-results --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Results root (one subdirectory per variant)
    ///
    /// Defaults to `general.results_root` from the config file.
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Number of repeats per benchmark
    #[arg(short = 'n', long, value_name = "R", env = "ANCHOR_RESULTS_REPEATS")]
    pub repeats: Option<usize>,

    /// Stages to run (comma-separated), in pipeline order
    #[arg(long, value_name = "STAGES", value_delimiter = ',')]
    pub stages: Option<Vec<Stage>>,

    /// Source trees copied into the root before aggregating (comma-separated)
    #[arg(long, value_name = "DIRS", value_delimiter = ',')]
    pub gather_from: Option<Vec<PathBuf>>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .anchor-results.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write a run summary to this file
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Summary format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: list the benchmark groups without deleting or writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .anchor-results.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.repeats == Some(0) {
            return Err("Repeats must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref stages) = self.stages {
            if stages.is_empty() {
                return Err("At least one stage must be selected".to_string());
            }
        }

        if let Some(ref root) = self.root {
            if root.exists() && !root.is_dir() {
                return Err(format!("Results root is not a directory: {}", root.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Selected stages, deduplicated and in pipeline order.
    pub fn effective_stages(&self) -> Vec<Stage> {
        let mut stages = self.stages.clone().unwrap_or_else(|| Stage::ALL.to_vec());
        stages.sort();
        stages.dedup();
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            root: Some(PathBuf::from("results")),
            repeats: None,
            stages: None,
            gather_from: None,
            config: None,
            summary: None,
            format: OutputFormat::Markdown,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_stage_list() {
        let args = Args::parse_from(["anchor-results", "res", "--stages", "map,tabular,map"]);
        assert_eq!(args.root, Some(PathBuf::from("res")));
        assert_eq!(args.effective_stages(), vec![Stage::Tabular, Stage::Map]);
    }

    #[test]
    fn test_default_stages() {
        let args = make_args();
        assert_eq!(args.effective_stages(), Stage::ALL.to_vec());
    }

    #[test]
    fn test_validation_zero_repeats() {
        let mut args = make_args();
        args.repeats = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
