//! Map table synthesis.
//!
//! Concatenates the merged per-data-structure map tables of a variant into
//! one table in a fixed data-structure order, plus an optimized/baseline
//! interleave when baseline tables are present. No averaging happens here.

use crate::config::MapConfig;
use crate::error::{AggregateError, Result};
use crate::locator::{list_file_names, VariantDir};
use crate::output::{read_text, write_atomic};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// Synthesizer over one variant directory.
pub struct MapSynthesizer<'a> {
    config: &'a MapConfig,
}

impl<'a> MapSynthesizer<'a> {
    pub fn new(config: &'a MapConfig) -> Self {
        Self { config }
    }

    /// Whether `variant` takes part in synthesis.
    pub fn applies_to(&self, variant: &VariantDir) -> bool {
        variant.name.ends_with(&self.config.variant_tag)
    }

    /// Name of the optimized table for a data structure.
    pub fn table_name(&self, structure: &str) -> String {
        format!("{}{}{}", self.config.table_prefix, structure, self.config.table_suffix)
    }

    /// Name of the baseline table for a data structure.
    pub fn baseline_table_name(&self, structure: &str) -> String {
        format!(
            "{}{}_{}{}",
            self.config.table_prefix, structure, self.config.baseline_marker, self.config.table_suffix
        )
    }

    /// Name of the synthesized table.
    pub fn output_name(&self) -> String {
        format!(
            "{}{}",
            self.config.table_prefix.trim_end_matches('_'),
            self.config.table_suffix
        )
    }

    /// Name of the synthesized baseline interleave.
    pub fn baseline_output_name(&self) -> String {
        format!(
            "{}{}{}",
            self.config.table_prefix, self.config.baseline_marker, self.config.table_suffix
        )
    }

    /// Write the synthesized table(s) of `variant`; returns the files written.
    pub fn synthesize(&self, variant: &VariantDir) -> Result<Vec<PathBuf>> {
        let outputs: HashSet<String> = [self.output_name(), self.baseline_output_name()].into();
        let tables: Vec<String> = list_file_names(&variant.path)?
            .into_iter()
            .filter(|name| {
                name.starts_with(&self.config.table_prefix)
                    && name.ends_with(&self.config.table_suffix)
                    && !outputs.contains(name)
            })
            .collect();
        let has_baseline = tables
            .iter()
            .any(|name| name.contains(&self.config.baseline_marker));
        debug!(
            "{}: {} map tables, baseline present: {}",
            variant.name,
            tables.len(),
            has_baseline
        );

        // Outputs take the permissions of the first table read.
        let reference = self
            .config
            .order
            .first()
            .map(|structure| variant.path.join(self.table_name(structure)));
        let mut pending = Vec::new();

        let mut content = self.preamble(&self.config.title);
        for structure in &self.config.order {
            content.push_str(&self.body(variant, &self.table_name(structure))?);
        }
        pending.push((variant.path.join(self.output_name()), content));

        if has_baseline {
            let mut content = self.preamble(&self.config.baseline_title);
            for structure in &self.config.baseline_order {
                content.push_str(&self.body(variant, &self.table_name(structure))?);
                content.push_str(&self.body(variant, &self.baseline_table_name(structure))?);
            }
            pending.push((variant.path.join(self.baseline_output_name()), content));
        }

        // Every input was read; nothing is written if one was missing.
        let mut written = Vec::new();
        for (path, content) in pending {
            write_atomic(&path, &content, reference.as_deref())?;
            info!("Synthesized {}", path.display());
            written.push(path);
        }

        Ok(written)
    }

    fn preamble(&self, title: &str) -> String {
        format!("{}\n{}\n", title, self.config.header)
    }

    /// Rows of one table after its title and header lines.
    fn body(&self, variant: &VariantDir, name: &str) -> Result<String> {
        let path = variant.path.join(name);
        if !path.is_file() {
            return Err(AggregateError::MissingInput {
                variant: variant.name.clone(),
                path,
            });
        }

        let text = read_text(&path)?;
        let mut body: String = text
            .split_inclusive('\n')
            .skip(self.config.skip_rows)
            .filter(|line| !line.trim().is_empty())
            .collect();
        if !body.is_empty() && !body.ends_with('\n') {
            body.push('\n');
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    fn variant(dir: &Path) -> VariantDir {
        let path = dir.join("anchor_enc_scone");
        std::fs::create_dir_all(&path).unwrap();
        VariantDir {
            name: "anchor_enc_scone".to_string(),
            path,
        }
    }

    fn write_table(variant: &VariantDir, name: &str, row: &str) {
        std::fs::write(
            variant.path.join(name),
            format!("map_custom: map_custom [15] [group: pmemobj]\ntotal-avg[sec];type\n{}\n", row),
        )
        .unwrap();
    }

    fn config() -> MapConfig {
        MapConfig {
            header: "total-avg[sec];type".to_string(),
            ..MapConfig::default()
        }
    }

    #[test]
    fn test_names() {
        let config = MapConfig::default();
        let synth = MapSynthesizer::new(&config);
        assert_eq!(synth.table_name("ctree"), "anchor_pmembench_map_ctree_result");
        assert_eq!(
            synth.baseline_table_name("rbtree"),
            "anchor_pmembench_map_rbtree_non_opt_result"
        );
        assert_eq!(synth.output_name(), "anchor_pmembench_map_result");
        assert_eq!(synth.baseline_output_name(), "anchor_pmembench_map_non_opt_result");
    }

    #[test]
    fn test_applies_to_tagged_variants_only() {
        let config = MapConfig::default();
        let synth = MapSynthesizer::new(&config);
        let tagged = VariantDir {
            name: "anchor_enc_scone".to_string(),
            path: PathBuf::from("x"),
        };
        let plain = VariantDir {
            name: "anchor_enc".to_string(),
            path: PathBuf::from("x"),
        };
        assert!(synth.applies_to(&tagged));
        assert!(!synth.applies_to(&plain));
    }

    #[test]
    fn test_canonical_order_regardless_of_listing() {
        let temp_dir = TempDir::new().unwrap();
        let variant = variant(temp_dir.path());
        let config = config();
        let synth = MapSynthesizer::new(&config);

        // Written in reverse so directory order cannot produce the result.
        for structure in ["hashmap_tx", "rbtree", "rtree", "btree", "ctree"] {
            write_table(&variant, &synth.table_name(structure), &format!("1.5;{}", structure));
        }

        let written = synth.synthesize(&variant).unwrap();
        assert_eq!(written, vec![variant.path.join("anchor_pmembench_map_result")]);
        assert_eq!(
            std::fs::read_to_string(&written[0]).unwrap(),
            "map_custom: map_custom [15] [group: pmemobj]\n\
             total-avg[sec];type\n\
             1.5;ctree\n\
             1.5;btree\n\
             1.5;rtree\n\
             1.5;rbtree\n\
             1.5;hashmap_tx\n"
        );
    }

    #[test]
    fn test_baseline_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let variant = variant(temp_dir.path());
        let config = config();
        let synth = MapSynthesizer::new(&config);

        for structure in &config.order {
            write_table(&variant, &synth.table_name(structure), &format!("1;{}", structure));
        }
        for structure in &config.baseline_order {
            write_table(
                &variant,
                &synth.baseline_table_name(structure),
                &format!("2;{}_base", structure),
            );
        }
        // A stale synthesized output must not be picked up as an input.
        std::fs::write(variant.path.join(synth.output_name()), "stale\n").unwrap();

        let written = synth.synthesize(&variant).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(
            std::fs::read_to_string(&written[1]).unwrap(),
            "map_custom: map_custom [18] [group: pmemobj]\n\
             total-avg[sec];type\n\
             1;ctree\n\
             2;ctree_base\n\
             1;btree\n\
             2;btree_base\n\
             1;rbtree\n\
             2;rbtree_base\n"
        );
    }

    #[test]
    fn test_missing_table_fails() {
        let temp_dir = TempDir::new().unwrap();
        let variant = variant(temp_dir.path());
        let config = config();
        let synth = MapSynthesizer::new(&config);

        for structure in ["ctree", "btree", "rbtree", "hashmap_tx"] {
            write_table(&variant, &synth.table_name(structure), "1;x");
        }

        let err = synth.synthesize(&variant).unwrap_err();
        match err {
            AggregateError::MissingInput { variant: name, path } => {
                assert_eq!(name, "anchor_enc_scone");
                assert!(path.ends_with("anchor_pmembench_map_rtree_result"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!variant.path.join(synth.output_name()).exists());
    }
}
