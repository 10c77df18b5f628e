use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::role::{RoleTable, TextureRole};

/// A texture discovered under the scanned root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureFile {
    /// Path relative to the scanned root.
    pub relative_path: Utf8PathBuf,
    pub role: TextureRole,
    /// Set for alias suffixes such as `_diffuse`.
    pub alias: bool,
    /// Relative path with the role suffix and extension stripped, `/` separated.
    pub base_name: String,
    /// File-name part of [`base_name`](Self::base_name).
    pub stem: String,
}

impl TextureFile {
    /// Classify a root-relative path against the role table.
    ///
    /// Returns `None` for files the table does not recognize.
    pub fn classify(relative_path: &Utf8Path, table: &RoleTable) -> Option<Self> {
        let file_name = relative_path.file_name()?;
        let class = table.classify(file_name)?;

        let parent = relative_path
            .parent()
            .map(forward_slashes)
            .unwrap_or_default();
        let base_name = if parent.is_empty() {
            class.stem.clone()
        } else {
            format!("{}/{}", parent, class.stem)
        };

        Some(Self {
            relative_path: relative_path.to_path_buf(),
            role: class.role,
            alias: class.alias,
            base_name,
            stem: class.stem,
        })
    }

    /// Relative path with `/` separators, as written into documents.
    pub fn asset_path(&self) -> String {
        forward_slashes(&self.relative_path)
    }

    pub fn file_name(&self) -> &str {
        self.relative_path.file_name().unwrap_or_default()
    }
}

fn forward_slashes(path: &Utf8Path) -> String {
    path.components()
        .map(|c| c.as_str())
        .filter(|c| *c != ".")
        .collect::<Vec<_>>()
        .join("/")
}
