//! All-or-nothing document writes.

use std::io::Write;

use camino::Utf8Path;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::Result;

/// Whether a write replaced an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteOutcome {
    Created,
    Modified,
}

/// Replace the contents of `path` in one step.
///
/// The contents are written to a temp file next to the target and renamed over
/// it, so a failed write leaves the previous document untouched. The
/// created/modified classification is a best-effort existence check made
/// before the write.
pub fn write_document(path: &Utf8Path, contents: &str) -> Result<WriteOutcome> {
    let outcome = if path.as_std_path().exists() {
        WriteOutcome::Modified
    } else {
        WriteOutcome::Created
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir.as_std_path())?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path.as_std_path())?;

    tracing::info!("{:?} {}", outcome, path);
    Ok(outcome)
}
