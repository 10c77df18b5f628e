//! End-to-end mod build: textures in, override documents out.
//!
//! The [`ModBuilder`] runs the full pipeline over one texture directory.
//!
//! # Build Algorithm
//!
//! 1. Validate that the target directory exists.
//! 2. Discover `.dds` files (top level only unless recursive).
//! 3. Group them by base name and resolve each group's [`IdentityKey`], either
//!    from the base name or from the xxHash3 of the identity texture's mip 0.
//!    Identity collisions keep the first-seen group (or abort, per
//!    [`CollisionPolicy`]).
//! 4. Write `<output>.usda`, plus one shard per role in sharded mode. When
//!    stitching, the root layer is never overwritten: a base document that
//!    would land on it goes to `<output>_base.usda`.
//! 5. Optionally append the shards on disk (and a relocated base) to the root
//!    layer's `subLayers`, in either mode.
//!
//! [`IdentityKey`]: rmx_texture::IdentityKey

use std::sync::Arc;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use rmx_texture::{
    discover_files, CollisionPolicy, DiscoverOptions, FilteredGroup, IdentityCollision,
    IdentityResolver, RoleGrouper, RoleTable,
};
use serde::Serialize;

use crate::bindings::ShaderBindings;
use crate::error::{Error, Result};
use crate::sublayer::{stitch_sublayers, StitchOutcome};
use crate::synthesizer::{OutputMode, SynthesisOptions, Synthesizer, WrittenDocument};
use crate::writer::WriteOutcome;

/// Name of the root layer the Remix toolkit creates for a mod.
pub const DEFAULT_ROOT_DOCUMENT: &str = "mod.usda";
pub const DEFAULT_OUTPUT_NAME: &str = "mod";

/// Stages of the build, emitted in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModStage {
    Discovering,
    Grouping,
    Writing,
    Stitching,
    Complete,
}

type ProgressCallback = Arc<dyn Fn(ModStage) + Send + Sync>;

/// Summary returned after a build completes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModBuildResult {
    pub target_dir: Utf8PathBuf,
    /// Documents that did not exist before this run.
    pub created: Vec<Utf8PathBuf>,
    /// Documents that were overwritten, including a stitched root layer.
    pub modified: Vec<Utf8PathBuf>,
    pub documents: Vec<WrittenDocument>,
    /// Number of material override blocks, across all documents.
    pub materials: usize,
    pub textures: usize,
    pub collisions: Vec<IdentityCollision>,
    pub filtered: Vec<FilteredGroup>,
    pub stitch: Option<StitchOutcome>,
    #[serde(skip)]
    pub build_time: Duration,
}

/// Configures and runs a mod build.
///
/// ```no_run
/// use rmx_usda::ModBuilder;
///
/// # fn main() -> rmx_usda::Result<()> {
/// let result = ModBuilder::new("rtx-remix/mods/MyMod")
///     .with_hashing(true)
///     .with_sharded(true)
///     .with_sublayers(true)
///     .build()?;
/// println!("{} documents written", result.documents.len());
/// # Ok(())
/// # }
/// ```
pub struct ModBuilder {
    target_dir: Utf8PathBuf,
    output_name: String,
    root_document: String,
    mode: OutputMode,
    hashing: bool,
    hash_filter: bool,
    sublayers: bool,
    recursive: bool,
    reference_dir: Option<Utf8PathBuf>,
    collision_policy: CollisionPolicy,
    table: RoleTable,
    bindings: ShaderBindings,
    progress_callback: Option<ProgressCallback>,
}

impl ModBuilder {
    pub fn new(target_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            root_document: DEFAULT_ROOT_DOCUMENT.to_string(),
            mode: OutputMode::Single,
            hashing: false,
            hash_filter: false,
            sublayers: false,
            recursive: false,
            reference_dir: None,
            collision_policy: CollisionPolicy::default(),
            table: RoleTable::remix(),
            bindings: ShaderBindings::remix(),
            progress_callback: None,
        }
    }

    /// Base name of the generated documents, without extension.
    pub fn with_output_name(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = output_name.into();
        self
    }

    /// File name of the root layer used for stitching, relative to the target.
    pub fn with_root_document(mut self, root_document: impl Into<String>) -> Self {
        self.root_document = root_document.into();
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_sharded(self, sharded: bool) -> Self {
        self.with_mode(if sharded {
            OutputMode::Sharded
        } else {
            OutputMode::Single
        })
    }

    /// Key groups by content hash instead of base name.
    pub fn with_hashing(mut self, hashing: bool) -> Self {
        self.hashing = hashing;
        self
    }

    /// Drop groups whose key is not a 16 digit hex hash.
    pub fn with_hash_filter(mut self, hash_filter: bool) -> Self {
        self.hash_filter = hash_filter;
        self
    }

    /// Stitch shards found on disk into the root layer.
    pub fn with_sublayers(mut self, sublayers: bool) -> Self {
        self.sublayers = sublayers;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Hash identity textures from this directory instead of the target.
    pub fn with_reference_dir(mut self, reference_dir: Option<Utf8PathBuf>) -> Self {
        self.reference_dir = reference_dir;
        self
    }

    pub fn with_collision_policy(mut self, collision_policy: CollisionPolicy) -> Self {
        self.collision_policy = collision_policy;
        self
    }

    pub fn with_role_table(mut self, table: RoleTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_bindings(mut self, bindings: ShaderBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ModStage) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn root_document_path(&self) -> Utf8PathBuf {
        self.target_dir.join(&self.root_document)
    }

    pub fn build(&self) -> Result<ModBuildResult> {
        let start_time = Instant::now();

        if !self.target_dir.as_std_path().is_dir() {
            return Err(Error::InvalidTargetDir(self.target_dir.clone()));
        }
        if let Some(reference_dir) = &self.reference_dir {
            if !reference_dir.as_std_path().is_dir() {
                return Err(Error::InvalidTargetDir(reference_dir.clone()));
            }
        }

        tracing::info!("Building mod documents in {}", self.target_dir);
        tracing::info!(
            "Mode: {:?}, hashing: {}, hash filter: {}, sublayers: {}",
            self.mode,
            self.hashing,
            self.hash_filter,
            self.sublayers
        );

        self.emit(ModStage::Discovering);
        let files = discover_files(
            &self.target_dir,
            DiscoverOptions {
                recursive: self.recursive,
            },
        )?;
        tracing::info!("Discovered {} files", files.len());

        self.emit(ModStage::Grouping);
        let resolver = IdentityResolver::new(self.target_dir.clone())
            .with_hashing(self.hashing)
            .with_reference_dir(self.reference_dir.clone());
        let report = RoleGrouper::new(&self.table)
            .with_hash_filter(self.hash_filter)
            .with_collision_policy(self.collision_policy)
            .group(&files, &resolver)?;
        let textures = report.groups.iter().map(|group| group.files().count()).sum();
        tracing::info!(
            "Grouped {} textures into {} materials ({} collisions, {} filtered)",
            textures,
            report.len(),
            report.collisions.len(),
            report.filtered.len()
        );

        self.emit(ModStage::Writing);
        let synthesizer = Synthesizer::new(&self.table, &self.bindings);
        let mut options = SynthesisOptions::new(self.target_dir.clone(), self.output_name.clone())
            .with_mode(self.mode);
        if self.sublayers {
            options = options.with_reserved_path(self.root_document_path());
            if synthesizer.base_relocated(&options) {
                tracing::info!(
                    "Output {} is the root layer, writing base document to {}",
                    self.root_document_path(),
                    synthesizer.document_path(&options, None)
                );
            }
        }
        let synthesis = synthesizer.synthesize(&report, &options)?;

        let mut created = synthesis.created;
        let mut modified = synthesis.modified;

        let stitch = if self.sublayers {
            self.emit(ModStage::Stitching);
            let outcome = stitch_sublayers(
                &self.root_document_path(),
                &synthesizer.stitch_candidates(&options),
            )?;
            match outcome.write {
                Some(WriteOutcome::Modified) => modified.push(outcome.root.clone()),
                Some(WriteOutcome::Created) => created.push(outcome.root.clone()),
                None => {}
            }
            Some(outcome)
        } else {
            None
        };

        let build_time = start_time.elapsed();
        tracing::info!("Mod build complete in {:?}", build_time);
        self.emit(ModStage::Complete);

        Ok(ModBuildResult {
            target_dir: self.target_dir.clone(),
            created,
            modified,
            materials: synthesis.documents.iter().map(|document| document.materials).sum(),
            documents: synthesis.documents,
            textures,
            collisions: report.collisions,
            filtered: report.filtered,
            stitch,
            build_time,
        })
    }

    fn emit(&self, stage: ModStage) {
        if let Some(callback) = &self.progress_callback {
            callback(stage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_invalid_target_dir() {
        let err = ModBuilder::new("/definitely/not/a/dir").build().unwrap_err();
        assert!(matches!(err, Error::InvalidTargetDir(_)));
    }

    #[test]
    fn test_invalid_reference_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = camino::Utf8Path::from_path(dir.path()).unwrap();
        let err = ModBuilder::new(target)
            .with_reference_dir(Some(target.join("missing")))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTargetDir(path) if path.ends_with("missing")));
    }

    #[test]
    fn test_progress_stages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let target = camino::Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(target.join("mod.usda"), "#usda 1.0\n").unwrap();

        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();
        ModBuilder::new(target)
            .with_output_name("generated")
            .with_sharded(true)
            .with_sublayers(true)
            .with_progress(move |stage| sink.lock().unwrap().push(stage))
            .build()
            .unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                ModStage::Discovering,
                ModStage::Grouping,
                ModStage::Writing,
                ModStage::Stitching,
                ModStage::Complete,
            ]
        );
    }

    #[test]
    fn test_single_mode_stitches_shards_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let target = camino::Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(target.join("mod.usda"), "#usda 1.0\n").unwrap();
        std::fs::write(target.join("textures_normal.usda"), "#usda 1.0\n").unwrap();

        let result = ModBuilder::new(target)
            .with_output_name("textures")
            .with_sublayers(true)
            .build()
            .unwrap();

        let stitch = result.stitch.unwrap();
        assert_eq!(stitch.appended, vec!["./textures_normal.usda"]);
        assert_eq!(result.created, vec![target.join("textures.usda")]);
        assert_eq!(result.modified, vec![target.join("mod.usda")]);
        assert_eq!(result.materials, 0);
    }

    #[test]
    fn test_single_mode_without_sublayers_writes_root_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = camino::Utf8Path::from_path(dir.path()).unwrap();

        let result = ModBuilder::new(target).build().unwrap();
        assert!(result.stitch.is_none());
        assert_eq!(result.created, vec![target.join("mod.usda")]);
    }
}
