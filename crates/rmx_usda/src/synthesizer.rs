//! Override document synthesis from grouped textures.
//!
//! In [`OutputMode::Single`] every group lands in `<output>.usda` with all of
//! its role inputs. In [`OutputMode::Sharded`] `<output>.usda` only carries the
//! identity (diffuse) inputs and each shardable role gets its own
//! `<output>_<suffix>.usda`, which is skipped if no group has that role.
//!
//! A reserved path (the stitch root) is never overwritten: if `<output>.usda`
//! resolves to it, the base document is written to `<output>_base.usda`
//! instead.

use camino::{Utf8Path, Utf8PathBuf};
use rmx_texture::{AssetGroup, GroupReport, RoleTable, TextureRole};
use serde::{Deserialize, Serialize};

use crate::bindings::ShaderBindings;
use crate::document::OverrideDocument;
use crate::error::Result;
use crate::writer::{write_document, WriteOutcome};

const DOCUMENT_EXTENSION: &str = "usda";
const RELOCATED_BASE_SUFFIX: &str = "base";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// One document with every role.
    #[default]
    Single,
    /// A base document plus one document per role.
    Sharded,
}

#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub output_dir: Utf8PathBuf,
    /// Document base name, without extension.
    pub output_name: String,
    pub mode: OutputMode,
    /// Document that synthesis must not overwrite.
    pub reserved: Option<Utf8PathBuf>,
}

impl SynthesisOptions {
    pub fn new(output_dir: impl Into<Utf8PathBuf>, output_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            output_name: output_name.into(),
            mode: OutputMode::default(),
            reserved: None,
        }
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_reserved_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.reserved = Some(path.into());
        self
    }
}

/// A document written by [`Synthesizer::synthesize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenDocument {
    pub path: Utf8PathBuf,
    /// `None` for the base document, otherwise the shard's role.
    pub role: Option<TextureRole>,
    pub materials: usize,
    pub outcome: WriteOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisReport {
    pub created: Vec<Utf8PathBuf>,
    pub modified: Vec<Utf8PathBuf>,
    pub documents: Vec<WrittenDocument>,
}

impl SynthesisReport {
    fn record(&mut self, document: WrittenDocument) {
        match document.outcome {
            WriteOutcome::Created => self.created.push(document.path.clone()),
            WriteOutcome::Modified => self.modified.push(document.path.clone()),
        }
        self.documents.push(document);
    }

    /// Shard documents that were written, in role order.
    pub fn shards(&self) -> impl Iterator<Item = &WrittenDocument> {
        self.documents.iter().filter(|document| document.role.is_some())
    }
}

/// Turns a [`GroupReport`] into override documents on disk.
pub struct Synthesizer<'a> {
    table: &'a RoleTable,
    bindings: &'a ShaderBindings,
}

impl<'a> Synthesizer<'a> {
    pub fn new(table: &'a RoleTable, bindings: &'a ShaderBindings) -> Self {
        Self { table, bindings }
    }

    /// Document with every group and all of its present roles.
    pub fn build_combined(&self, groups: &[AssetGroup]) -> OverrideDocument {
        let mut document = OverrideDocument::new();
        for group in groups {
            document.push(self.bindings.material(group, |_| true));
        }
        document
    }

    /// Document with only `role`'s inputs, for the groups that have it.
    pub fn build_role(&self, groups: &[AssetGroup], role: TextureRole) -> OverrideDocument {
        let mut document = OverrideDocument::new();
        for group in groups.iter().filter(|group| group.has(role)) {
            document.push(self.bindings.material(group, |r| r == role));
        }
        document
    }

    /// Path of the base document (`role == None`) or of a role's shard.
    pub fn document_path(&self, options: &SynthesisOptions, role: Option<TextureRole>) -> Utf8PathBuf {
        let name = match role.and_then(|role| self.table.token_for_role(role)) {
            Some(token) => format!("{}_{}.{}", options.output_name, token, DOCUMENT_EXTENSION),
            None => {
                let plain = options
                    .output_dir
                    .join(format!("{}.{}", options.output_name, DOCUMENT_EXTENSION));
                if !is_reserved(options, &plain) {
                    return plain;
                }
                format!(
                    "{}_{}.{}",
                    options.output_name, RELOCATED_BASE_SUFFIX, DOCUMENT_EXTENSION
                )
            }
        };
        options.output_dir.join(name)
    }

    /// Whether the base document was moved off the reserved path.
    pub fn base_relocated(&self, options: &SynthesisOptions) -> bool {
        let plain = options
            .output_dir
            .join(format!("{}.{}", options.output_name, DOCUMENT_EXTENSION));
        is_reserved(options, &plain)
    }

    /// Documents to reference from the root layer: the relocated base, if
    /// any, then every shard in role order.
    pub fn stitch_candidates(&self, options: &SynthesisOptions) -> Vec<Utf8PathBuf> {
        let mut candidates = Vec::new();
        if self.base_relocated(options) {
            candidates.push(self.document_path(options, None));
        }
        candidates.extend(self.shard_paths(options));
        candidates
    }

    /// Every shard path in role order, whether or not it exists.
    pub fn shard_paths(&self, options: &SynthesisOptions) -> Vec<Utf8PathBuf> {
        self.table
            .shard_roles()
            .map(|(role, _)| self.document_path(options, Some(role)))
            .collect()
    }

    pub fn synthesize(&self, report: &GroupReport, options: &SynthesisOptions) -> Result<SynthesisReport> {
        let mut synthesis = SynthesisReport::default();

        match options.mode {
            OutputMode::Single => {
                let document = self.build_combined(&report.groups);
                let path = self.document_path(options, None);
                synthesis.record(write(&path, None, &document)?);
            }
            OutputMode::Sharded => {
                // Written even when empty.
                let base = self.build_role(&report.groups, TextureRole::Identity);
                let path = self.document_path(options, None);
                synthesis.record(write(&path, None, &base)?);

                for (role, token) in self.table.shard_roles() {
                    let document = self.build_role(&report.groups, role);
                    if document.is_empty() {
                        tracing::debug!("No {} textures, skipping shard '{}'", role, token);
                        continue;
                    }
                    let path = self.document_path(options, Some(role));
                    synthesis.record(write(&path, Some(role), &document)?);
                }
            }
        }

        Ok(synthesis)
    }
}

fn is_reserved(options: &SynthesisOptions, path: &Utf8Path) -> bool {
    options
        .reserved
        .as_deref()
        .is_some_and(|reserved| same_path(reserved, path))
}

fn same_path(a: &Utf8Path, b: &Utf8Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize_utf8(), b.canonicalize_utf8()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn write(path: &Utf8Path, role: Option<TextureRole>, document: &OverrideDocument) -> Result<WrittenDocument> {
    let outcome = write_document(path, &document.to_usda())?;
    Ok(WrittenDocument {
        path: path.to_path_buf(),
        role,
        materials: document.len(),
        outcome,
    })
}
