//! File I/O for merged outputs.
//!
//! Merged files are written to a temporary file in the destination
//! directory and renamed over the target, so a failure never leaves a
//! half-written merge behind.

use crate::error::{AggregateError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Read a whole file, tagging failures with its path.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| AggregateError::io(path, e))
}

/// Replace `path` with `content`.
///
/// The temporary file is created private; when `like` is given its
/// permissions are copied onto the output before the rename, so merged
/// files are as readable as the raw repeats they came from.
pub fn write_atomic(path: &Path, content: &str, like: Option<&Path>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AggregateError::io(dir, e))?;
    if let Err(e) = tmp.write_all(content.as_bytes()).and_then(|_| tmp.flush()) {
        return Err(AggregateError::io(tmp.path(), e));
    }

    if let Some(like) = like {
        let permissions = fs::metadata(like)
            .map_err(|e| AggregateError::io(like, e))?
            .permissions();
        fs::set_permissions(tmp.path(), permissions).map_err(|e| AggregateError::io(tmp.path(), e))?;
    }

    debug!("Persisting {} -> {}", tmp.path().display(), path.display());
    tmp.persist(path)
        .map_err(|e| AggregateError::io(path, e.error))?;

    Ok(())
}

/// Delete a previous merged output, if any.
pub fn remove_stale(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AggregateError::io(path, e)),
    }
}
