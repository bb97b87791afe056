//! Result gathering.
//!
//! Copies raw result trees (e.g. native and enclave runs kept in separate
//! places) into the results root before aggregation.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Copy every file under each of `sources` into `root`, keeping relative paths.
///
/// Existing files are overwritten. Returns the number of files copied.
pub fn gather(sources: &[impl AsRef<Path>], root: &Path, show_progress: bool) -> Result<usize> {
    fs::create_dir_all(root)
        .with_context(|| format!("Failed to create results root {}", root.display()))?;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} files gathered {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Some(pb)
    } else {
        None
    };

    let mut copied = 0;
    for source in sources {
        let source = source.as_ref();
        if !source.is_dir() {
            anyhow::bail!("Result source is not a directory: {}", source.display());
        }
        info!("Gathering results from {}", source.display());

        for entry in WalkDir::new(source).min_depth(1) {
            let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
            let rel = entry
                .path()
                .strip_prefix(source)
                .with_context(|| format!("Unexpected path {}", entry.path().display()))?;
            let target = root.join(rel);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("Failed to create {}", target.display()))?;
            } else if entry.file_type().is_file() {
                debug!("{} -> {}", entry.path().display(), target.display());
                fs::copy(entry.path(), &target).with_context(|| {
                    format!("Failed to copy {} to {}", entry.path().display(), target.display())
                })?;
                copied += 1;
                if let Some(ref pb) = progress_bar {
                    pb.inc(1);
                }
            }
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    info!("Gathered {} files into {}", copied, root.display());
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_gather_merges_trees() {
        let native = TempDir::new().unwrap();
        let enclave = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();

        std::fs::create_dir(native.path().join("anchor_enc")).unwrap();
        std::fs::write(native.path().join("anchor_enc/bench_1"), "1").unwrap();
        std::fs::create_dir(enclave.path().join("anchor_enc_scone")).unwrap();
        std::fs::write(enclave.path().join("anchor_enc_scone/bench_1"), "2").unwrap();

        let copied = gather(&[native.path(), enclave.path()], root.path(), false).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(
            std::fs::read_to_string(root.path().join("anchor_enc/bench_1")).unwrap(),
            "1"
        );
        assert_eq!(
            std::fs::read_to_string(root.path().join("anchor_enc_scone/bench_1")).unwrap(),
            "2"
        );
    }

    #[test]
    fn test_gather_overwrites() {
        let source = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("v")).unwrap();
        std::fs::write(root.path().join("v/bench_1"), "old").unwrap();
        std::fs::create_dir(source.path().join("v")).unwrap();
        std::fs::write(source.path().join("v/bench_1"), "new").unwrap();

        gather(&[source.path()], root.path(), false).unwrap();
        assert_eq!(std::fs::read_to_string(root.path().join("v/bench_1")).unwrap(), "new");
    }

    #[test]
    fn test_missing_source_is_error() {
        let root = TempDir::new().unwrap();
        let result = gather(&[Path::new("/nonexistent/results")], root.path(), false);
        assert!(result.is_err());
    }
}
