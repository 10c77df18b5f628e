use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Options for [`discover_files`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoverOptions {
    /// Descend into subdirectories instead of listing only the top level.
    pub recursive: bool,
}

/// List every regular file under `root`, relative to it.
///
/// Entries are sorted by file name within each directory so that first-seen
/// tie-breaking during grouping is reproducible across runs and platforms.
pub fn discover_files(root: &Utf8Path, options: DiscoverOptions) -> Result<Vec<Utf8PathBuf>> {
    let mut walker = WalkDir::new(root.as_std_path())
        .min_depth(1)
        .sort_by_file_name();
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = Utf8PathBuf::from_path_buf(entry.into_path())
            .map_err(|path| Error::NonUtf8Path(path.display().to_string()))?;
        let relative = path
            .strip_prefix(root)
            .map_err(|_| Error::OutsideRoot {
                path: path.clone(),
                root: root.to_path_buf(),
            })?
            .to_path_buf();
        files.push(relative);
    }

    tracing::debug!("Discovered {} files under {}", files.len(), root);
    Ok(files)
}
