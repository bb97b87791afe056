//! anchor-results - averages repeated Anchor benchmark runs
//!
//! Post-processes the raw per-repeat result files of the Anchor
//! persistent-memory key-value benchmarks into one averaged file per
//! benchmark, ready for the plotting scripts.
//!
//! Exit codes:
//!   0 - Success (every benchmark merged)
//!   1 - Runtime error (missing results root, bad config, invalid arguments)
//!   2 - At least one benchmark or synthesis failed; the others were merged

mod aggregate;
mod cli;
mod config;
mod error;
mod gather;
mod locator;
mod models;
mod output;
mod pipeline;
mod report;
mod synth;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::{RunMetadata, RunReport, RunSummary};
use pipeline::{Pipeline, RunOptions};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);

    info!("anchor-results v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .anchor-results.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run gathering and aggregation. Returns exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();
    let started_at = Utc::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    if config.general.repeats == 0 {
        anyhow::bail!("general.repeats must be at least 1");
    }

    let root = config.general.results_root.clone();
    let stages = args.effective_stages();

    if !config.gather.sources.is_empty() {
        println!("📥 Gathering results into {}", root.display());
        if args.dry_run {
            for source in &config.gather.sources {
                println!("   would copy {}", source.display());
            }
        } else {
            let copied = gather::gather(&config.gather.sources, &root, !args.quiet)?;
            println!("   {} files gathered", copied);
        }
    }

    if args.dry_run {
        println!("\n🔍 Dry run: listing benchmark groups (nothing is deleted or written)...");
    }

    println!("📂 Results root: {}", root.display());
    println!("   Repeats: {}", config.general.repeats);

    let pipeline = Pipeline::new(
        config.clone(),
        RunOptions {
            stages: stages.clone(),
            dry_run: args.dry_run,
            show_progress: !args.quiet,
        },
    );
    let outcomes = pipeline.run()?;

    let summary = RunSummary::from_outcomes(&outcomes);
    let report = RunReport {
        metadata: RunMetadata {
            results_root: root,
            started_at,
            repeats: config.general.repeats,
            stages,
            dry_run: args.dry_run,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        outcomes,
        summary: summary.clone(),
    };

    if let Some(ref path) = args.summary {
        let content = match args.format {
            OutputFormat::Json => report::generate_json_report(&report)?,
            OutputFormat::Markdown => report::generate_markdown_report(&report),
        };
        report::write_report(&content, path)?;
        info!("Summary written to {}", path.display());
    }

    println!("\n📊 Run Summary:");
    println!("   Units: {}", summary.total);
    println!(
        "   - ✅ Merged: {} | 📝 Planned: {} | ❌ Failed: {}",
        summary.merged, summary.planned, summary.failed
    );
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);

    if summary.failed > 0 {
        for outcome in report.outcomes.iter().filter(|o| o.is_failure()) {
            warn!("Failed: {} {}/{}", outcome.stage, outcome.variant, outcome.unit);
        }
        eprintln!(
            "\n⛔ {} unit(s) failed. See the log above (exit code 2).",
            summary.failed
        );
        return Ok(2);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
