//! Run orchestration.
//!
//! Runs the selected stages over every variant directory of the results
//! root, one unit of work at a time. A failing unit is recorded and
//! logged; its siblings are still processed.

use crate::aggregate::{self, AggregateOptions};
use crate::config::Config;
use crate::locator::{LocateConfig, ResultLocator, VariantDir};
use crate::models::{BenchmarkGroup, Stage, UnitOutcome, UnitStatus};
use crate::synth::MapSynthesizer;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info};

/// Options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub stages: Vec<Stage>,
    pub dry_run: bool,
    pub show_progress: bool,
}

/// A configured aggregation run.
pub struct Pipeline {
    config: Config,
    locator: ResultLocator,
    options: RunOptions,
}

impl Pipeline {
    pub fn new(config: Config, options: RunOptions) -> Self {
        let locator = ResultLocator::new(
            config.general.results_root.clone(),
            LocateConfig::new(config.general.repeats, &config.locator),
        );
        Self {
            config,
            locator,
            options,
        }
    }

    /// Run every selected stage; fails only on run-level errors.
    pub fn run(&self) -> Result<Vec<UnitOutcome>> {
        let variants = self.locator.variant_dirs().with_context(|| {
            format!(
                "Cannot read results root {}",
                self.locator.root().display()
            )
        })?;
        info!(
            "Found {} variant directories under {}",
            variants.len(),
            self.locator.root().display()
        );

        let mut outcomes = Vec::new();
        for stage in &self.options.stages {
            println!("\n🔁 Stage: {}", stage);
            let progress_bar = self.progress_bar(variants.len() as u64);

            for variant in &variants {
                info!("Processing directory {} ({})", variant.path.display(), stage);
                if let Some(ref pb) = progress_bar {
                    pb.set_message(variant.name.clone());
                }

                match stage {
                    Stage::Map => {
                        if let Some(outcome) = self.synthesize(variant) {
                            outcomes.push(outcome);
                        }
                    }
                    _ => outcomes.extend(self.aggregate_variant(*stage, variant)),
                }

                if let Some(ref pb) = progress_bar {
                    pb.inc(1);
                }
            }

            if let Some(pb) = progress_bar {
                pb.finish_and_clear();
            }
        }

        Ok(outcomes)
    }

    /// Merge every benchmark of `stage` in one variant directory.
    fn aggregate_variant(&self, stage: Stage, variant: &VariantDir) -> Vec<UnitOutcome> {
        let groups = match self.locator.locate(variant, stage) {
            Ok(groups) => groups,
            Err(e) => {
                error!("{}: {}", variant.name, e);
                return vec![UnitOutcome {
                    stage,
                    variant: variant.name.clone(),
                    unit: variant.path.display().to_string(),
                    status: UnitStatus::Failed {
                        error: e.to_string(),
                    },
                }];
            }
        };

        groups
            .iter()
            .map(|group| UnitOutcome {
                stage,
                variant: variant.name.clone(),
                unit: group.key.benchmark.clone(),
                status: self.aggregate_group(group),
            })
            .collect()
    }

    fn aggregate_group(&self, group: &BenchmarkGroup) -> UnitStatus {
        let repeats = group.observed();
        if self.options.dry_run {
            println!("   📄 {} [{}] ({} repeats)", group.key, group.kind, repeats);
            return UnitStatus::Planned { inputs: repeats };
        }

        println!("   📊 Benchmark: {}", group.key.benchmark);
        let options = AggregateOptions {
            repeats: self.config.general.repeats,
            marker: self.config.networking.marker.clone(),
        };

        let result = self
            .locator
            .purge_stale(group)
            .and_then(|_| aggregate::aggregate(group, &options));

        match result {
            Ok(output) => {
                debug!("{} -> {}", group.key, output.display());
                UnitStatus::Merged {
                    outputs: vec![output],
                    inputs: repeats,
                }
            }
            Err(e) => {
                error!("{}: {}", group.key, e);
                UnitStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Synthesize the map tables of a tagged variant.
    fn synthesize(&self, variant: &VariantDir) -> Option<UnitOutcome> {
        let synth = MapSynthesizer::new(&self.config.map);
        if !synth.applies_to(variant) {
            debug!("{}: not a {} variant, skipping map synthesis", variant.name, self.config.map.variant_tag);
            return None;
        }

        let status = if self.options.dry_run {
            println!("   📄 {} [map synthesis]", variant.name);
            UnitStatus::Planned {
                inputs: self.config.map.order.len(),
            }
        } else {
            match synth.synthesize(variant) {
                Ok(outputs) => UnitStatus::Merged {
                    inputs: self.config.map.order.len(),
                    outputs,
                },
                Err(e) => {
                    error!("{}: map synthesis failed: {}", variant.name, e);
                    UnitStatus::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        Some(UnitOutcome {
            stage: Stage::Map,
            variant: variant.name.clone(),
            unit: synth.output_name(),
            status,
        })
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.options.show_progress {
            return None;
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    const BANNER: &str = "map_custom: map_custom [15] [group: pmemobj]\n";

    fn pipeline(root: &Path, stages: &[Stage], dry_run: bool) -> Pipeline {
        pipeline_with_repeats(root, stages, dry_run, 3)
    }

    fn pipeline_with_repeats(root: &Path, stages: &[Stage], dry_run: bool, repeats: usize) -> Pipeline {
        let mut config = Config::default();
        config.general.results_root = root.to_path_buf();
        config.general.repeats = repeats;
        config.map.header = "total-avg[sec];type".to_string();
        Pipeline::new(
            config,
            RunOptions {
                stages: stages.to_vec(),
                dry_run,
                show_progress: false,
            },
        )
    }

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn map_table(ops: &str, structure: &str) -> String {
        format!("{}total-avg[sec];type\n{};{}\n", BANNER, ops, structure)
    }

    #[test]
    fn test_missing_root_is_run_level_error() {
        let p = pipeline(Path::new("/nonexistent/results"), &Stage::ALL, false);
        assert!(p.run().is_err());
    }

    #[test]
    fn test_failure_is_isolated() {
        let root = TempDir::new().unwrap();
        let enc = root.path().join("anchor_enc");
        write(&enc, "anchor_breakdown_1", "reads 1 writes 2\n");
        write(&enc, "anchor_breakdown_2", "reads 3\n");
        write(&enc, "anchor_breakdown_lat_1", "lat 1\n");
        write(&enc, "anchor_breakdown_lat_2", "lat 3\n");
        let plain = root.path().join("plain");
        write(&plain, "anchor_breakdown_1", "reads 5\n");

        let outcomes = pipeline(root.path(), &[Stage::Breakdown], false).run().unwrap();

        assert_eq!(outcomes.len(), 3);
        let failed: Vec<_> = outcomes.iter().filter(|o| o.is_failure()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].unit, "anchor_breakdown");
        assert_eq!(failed[0].variant, "anchor_enc");

        assert!(!enc.join("anchor_breakdown").exists());
        assert_eq!(std::fs::read_to_string(enc.join("anchor_breakdown_lat")).unwrap(), "lat 2\n");
        assert_eq!(std::fs::read_to_string(plain.join("anchor_breakdown")).unwrap(), "reads 5\n");
    }

    #[test]
    fn test_rerun_does_not_double_count() {
        let root = TempDir::new().unwrap();
        let enc = root.path().join("anchor_enc");
        write(&enc, "bench_1", &format!("{}1;2\n", BANNER));
        write(&enc, "bench_2", &format!("{}3;4\n", BANNER));

        let p = pipeline(root.path(), &[Stage::Tabular], false);
        p.run().unwrap();
        p.run().unwrap();

        assert_eq!(
            std::fs::read_to_string(enc.join("bench")).unwrap(),
            format!("{}2;3\n", BANNER)
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let root = TempDir::new().unwrap();
        let enc = root.path().join("anchor_enc");
        write(&enc, "bench_1", &format!("{}1\n", BANNER));
        write(&enc, "bench", "stale");

        let outcomes = pipeline(root.path(), &Stage::ALL, true).run().unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, UnitStatus::Planned { inputs: 1 });
        assert_eq!(std::fs::read_to_string(enc.join("bench")).unwrap(), "stale");
    }

    #[test]
    fn test_full_run() {
        let root = TempDir::new().unwrap();
        let scone = root.path().join("anchor_enc_scone");

        for (structure, a, b) in [
            ("ctree", "1", "3"),
            ("btree", "2", "4"),
            ("rtree", "3", "5"),
            ("rbtree", "4", "6"),
            ("hashmap_tx", "5", "7"),
        ] {
            let stem = format!("anchor_pmembench_map_{}_result", structure);
            write(&scone, &format!("{}_1", stem), &map_table(a, structure));
            write(&scone, &format!("{}_2", stem), &map_table(b, structure));
        }
        write(&scone, "startup_50000_10_1", "9;9\n");
        write(&scone, "net_echo_1", "setup 1\nEnded experiment\nrtt 10\n");
        write(&scone, "net_echo_2", "setup 2\nEnded experiment\nrtt 20\n");

        let outcomes = pipeline_with_repeats(root.path(), &Stage::ALL, false, 2)
            .run()
            .unwrap();

        assert!(outcomes.iter().all(|o| !o.is_failure()), "{:?}", outcomes);
        // Five map tables, one networking category, one synthesis.
        assert_eq!(outcomes.len(), 7);
        assert!(!scone.join("startup_50000_10").exists());
        assert_eq!(std::fs::read_to_string(scone.join("net_echo")).unwrap(), "rtt 15\n");
        assert_eq!(
            std::fs::read_to_string(scone.join("anchor_pmembench_map_result")).unwrap(),
            format!(
                "{}total-avg[sec];type\n2;ctree\n3;btree\n4;rtree\n5;rbtree\n6;hashmap_tx\n",
                BANNER
            )
        );
    }
}
