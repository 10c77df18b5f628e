//! Grouping of role-tagged textures by identity key.
//!
//! # Algorithm
//!
//! 1. Classify every path against the [`RoleTable`]; unrecognized files are skipped.
//! 2. Gather role files per base name, in first-seen order.
//! 3. Resolve each base name's identity once, from its bare identity file or,
//!    failing that, its `_diffuse` alias.
//! 4. Optionally reject groups whose key is not hash-like.
//! 5. Deduplicate by identity key: the first base name wins and later ones
//!    are recorded as [`IdentityCollision`]s (or abort the run, depending on
//!    the [`CollisionPolicy`]).

use std::collections::{BTreeMap, HashMap};

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::{IdentityKey, IdentityResolver};
use crate::role::{RoleTable, TextureRole};
use crate::texture::TextureFile;

/// What to do when two different base names resolve to the same identity key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Keep the first-seen group and drop the later one whole.
    #[default]
    KeepFirst,
    /// Abort grouping with [`Error::IdentityCollision`].
    Error,
}

/// The set of role-tagged files sharing one identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroup {
    pub key: IdentityKey,
    /// Base name the group was discovered under.
    pub base_name: String,
    files: BTreeMap<TextureRole, TextureFile>,
}

impl AssetGroup {
    pub fn new(key: IdentityKey, base_name: impl Into<String>) -> Self {
        Self {
            key,
            base_name: base_name.into(),
            files: BTreeMap::new(),
        }
    }

    /// Attach a file, keeping an existing file for the same role.
    ///
    /// Returns `false` if the role was already occupied.
    pub fn insert(&mut self, file: TextureFile) -> bool {
        match self.files.entry(file.role) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(file);
                true
            }
        }
    }

    pub fn file(&self, role: TextureRole) -> Option<&TextureFile> {
        self.files.get(&role)
    }

    pub fn has(&self, role: TextureRole) -> bool {
        self.files.contains_key(&role)
    }

    /// Present roles in enumeration order.
    pub fn roles(&self) -> impl Iterator<Item = TextureRole> + '_ {
        self.files.keys().copied()
    }

    pub fn files(&self) -> impl Iterator<Item = &TextureFile> {
        self.files.values()
    }
}

/// A base name that was dropped because its key was already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCollision {
    pub key: IdentityKey,
    /// Base name of the group that was kept.
    pub kept: String,
    /// Base name whose files were discarded.
    pub dropped: String,
    pub dropped_files: Vec<Utf8PathBuf>,
}

/// A base name rejected by the hash filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredGroup {
    pub key: IdentityKey,
    pub base_name: String,
}

/// Outcome of [`RoleGrouper::group`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    /// Materialized groups in first-seen order.
    pub groups: Vec<AssetGroup>,
    pub collisions: Vec<IdentityCollision>,
    pub filtered: Vec<FilteredGroup>,
}

impl GroupReport {
    pub fn get(&self, key: &IdentityKey) -> Option<&AssetGroup> {
        self.groups.iter().find(|group| &group.key == key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Files gathered under one base name before identity resolution.
struct Bucket {
    base_name: String,
    stem: String,
    identity: Option<TextureFile>,
    alias: Option<TextureFile>,
    roles: Vec<TextureFile>,
}

impl Bucket {
    fn new(file: &TextureFile) -> Self {
        Self {
            base_name: file.base_name.clone(),
            stem: file.stem.clone(),
            identity: None,
            alias: None,
            roles: Vec::new(),
        }
    }

    fn push(&mut self, file: TextureFile) {
        let slot = match (file.role, file.alias) {
            (TextureRole::Identity, false) => &mut self.identity,
            (TextureRole::Identity, true) => &mut self.alias,
            _ => {
                self.roles.push(file);
                return;
            }
        };
        match slot.as_ref() {
            Some(existing) => tracing::warn!(
                "Ignoring {}: identity slot already taken by {}",
                file.relative_path,
                existing.relative_path
            ),
            None => *slot = Some(file),
        }
    }

    fn relative_paths(&self) -> Vec<Utf8PathBuf> {
        self.identity
            .iter()
            .chain(self.alias.iter())
            .chain(self.roles.iter())
            .map(|file| file.relative_path.clone())
            .collect()
    }
}

/// Partitions discovered files into identity-keyed [`AssetGroup`]s.
#[derive(Debug, Clone)]
pub struct RoleGrouper<'a> {
    table: &'a RoleTable,
    hash_filter: bool,
    collision_policy: CollisionPolicy,
}

impl<'a> RoleGrouper<'a> {
    pub fn new(table: &'a RoleTable) -> Self {
        Self {
            table,
            hash_filter: false,
            collision_policy: CollisionPolicy::default(),
        }
    }

    /// Only materialize groups whose identity key looks like a hash.
    pub fn with_hash_filter(mut self, hash_filter: bool) -> Self {
        self.hash_filter = hash_filter;
        self
    }

    pub fn with_collision_policy(mut self, collision_policy: CollisionPolicy) -> Self {
        self.collision_policy = collision_policy;
        self
    }

    /// Classify a list of root-relative paths, dropping unrecognized files.
    pub fn classify(&self, paths: &[Utf8PathBuf]) -> Vec<TextureFile> {
        paths
            .iter()
            .filter_map(|path| {
                let file = TextureFile::classify(path, self.table);
                if file.is_none() {
                    tracing::debug!("Skipping {}: not a recognized texture", path);
                }
                file
            })
            .collect()
    }

    /// Group root-relative paths into identity-keyed asset groups.
    pub fn group(
        &self,
        paths: &[Utf8PathBuf],
        resolver: &IdentityResolver,
    ) -> Result<GroupReport> {
        let files = self.classify(paths);

        let mut buckets: Vec<Bucket> = Vec::new();
        let mut bucket_index: HashMap<String, usize> = HashMap::new();
        for file in files {
            let idx = *bucket_index
                .entry(file.base_name.clone())
                .or_insert_with(|| {
                    buckets.push(Bucket::new(&file));
                    buckets.len() - 1
                });
            buckets[idx].push(file);
        }

        let mut report = GroupReport::default();
        let mut key_index: HashMap<IdentityKey, usize> = HashMap::new();

        for bucket in buckets {
            let key = match bucket.identity.as_ref().or(bucket.alias.as_ref()) {
                Some(source) => resolver.resolve(source)?,
                None => {
                    if resolver.hashing() {
                        tracing::warn!(
                            "No identity texture for '{}', falling back to its name",
                            bucket.base_name
                        );
                    }
                    IdentityKey::from_name(bucket.stem.clone())
                }
            };

            if self.hash_filter && !key.is_hash_like() {
                tracing::warn!(
                    "Filtered '{}': key '{}' is not a hash",
                    bucket.base_name,
                    key
                );
                report.filtered.push(FilteredGroup {
                    key,
                    base_name: bucket.base_name,
                });
                continue;
            }

            if let Some(&kept_idx) = key_index.get(&key) {
                let kept = report.groups[kept_idx].base_name.clone();
                match self.collision_policy {
                    CollisionPolicy::KeepFirst => {
                        tracing::warn!(
                            "Identity collision on {}: keeping '{}', dropping '{}'",
                            key,
                            kept,
                            bucket.base_name
                        );
                        report.collisions.push(IdentityCollision {
                            dropped_files: bucket.relative_paths(),
                            key,
                            kept,
                            dropped: bucket.base_name,
                        });
                        continue;
                    }
                    CollisionPolicy::Error => {
                        return Err(Error::IdentityCollision {
                            key,
                            kept,
                            dropped: bucket.base_name,
                        });
                    }
                }
            }

            let mut group = AssetGroup::new(key.clone(), bucket.base_name.clone());
            match (bucket.identity, bucket.alias) {
                (Some(identity), Some(alias)) => {
                    tracing::warn!(
                        "Ignoring {}: {} is used as the identity texture",
                        alias.relative_path,
                        identity.relative_path
                    );
                    group.insert(identity);
                }
                (Some(identity), None) => {
                    group.insert(identity);
                }
                (None, Some(alias)) => {
                    group.insert(alias);
                }
                (None, None) => {}
            }
            for file in bucket.roles {
                let relative_path = file.relative_path.clone();
                if !group.insert(file) {
                    tracing::warn!("Ignoring duplicate role texture {}", relative_path);
                }
            }

            tracing::debug!(
                "Group {} ({}): {:?}",
                group.key,
                group.base_name,
                group.roles().collect::<Vec<_>>()
            );
            key_index.insert(key, report.groups.len());
            report.groups.push(group);
        }

        tracing::info!(
            "Grouped textures into {} groups ({} collisions, {} filtered)",
            report.groups.len(),
            report.collisions.len(),
            report.filtered.len()
        );

        Ok(report)
    }
}
