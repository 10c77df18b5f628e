//! Texture roles and the suffix table that maps file names onto them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Function of a texture within a material.
///
/// The declaration order is the enumeration order used for shard documents and
/// sublayer stitching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextureRole {
    /// The unsuffixed (or `_diffuse`) base color texture.
    Identity,
    Normal,
    Emissive,
    Metallic,
    Rough,
}

impl fmt::Display for TextureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextureRole::Identity => "identity",
            TextureRole::Normal => "normal",
            TextureRole::Emissive => "emissive",
            TextureRole::Metallic => "metallic",
            TextureRole::Rough => "rough",
        };
        f.write_str(name)
    }
}

/// One recognized file name suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSuffix {
    /// Token after the last underscore, e.g. `normal` for `wood_normal.dds`.
    pub token: String,
    pub role: TextureRole,
    /// Alias suffixes map onto a role without naming its shard document.
    pub alias: bool,
}

/// Result of classifying a single file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// File stem with the role suffix removed.
    pub stem: String,
    pub role: TextureRole,
    /// Whether the role came from an alias suffix such as `_diffuse`.
    pub alias: bool,
}

/// Lookup table of recognized texture suffixes.
///
/// Shared by the grouper (file name → role) and the document synthesizer
/// (role → shard suffix) so that both agree on the same convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    extension: String,
    suffixes: Vec<RoleSuffix>,
}

impl RoleTable {
    /// An empty table for files with the given extension (without the dot).
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            suffixes: Vec::new(),
        }
    }

    /// The RTX Remix convention: `.dds` files with `_normal`, `_emissive`,
    /// `_metallic` and `_rough` variants, plus `_diffuse` as an alias for the
    /// base texture.
    pub fn remix() -> Self {
        Self::new("dds")
            .with_suffix("normal", TextureRole::Normal)
            .with_suffix("emissive", TextureRole::Emissive)
            .with_suffix("metallic", TextureRole::Metallic)
            .with_suffix("rough", TextureRole::Rough)
            .with_alias("diffuse", TextureRole::Identity)
    }

    pub fn with_suffix(mut self, token: impl Into<String>, role: TextureRole) -> Self {
        self.suffixes.push(RoleSuffix {
            token: token.into(),
            role,
            alias: false,
        });
        self
    }

    pub fn with_alias(mut self, token: impl Into<String>, role: TextureRole) -> Self {
        self.suffixes.push(RoleSuffix {
            token: token.into(),
            role,
            alias: true,
        });
        self
    }

    pub fn role_for_token(&self, token: &str) -> Option<&RoleSuffix> {
        self.suffixes
            .iter()
            .find(|suffix| suffix.token.eq_ignore_ascii_case(token))
    }

    /// Canonical suffix token for a role, if that role has one.
    pub fn token_for_role(&self, role: TextureRole) -> Option<&str> {
        self.suffixes
            .iter()
            .find(|suffix| suffix.role == role && !suffix.alias)
            .map(|suffix| suffix.token.as_str())
    }

    /// Roles that get their own shard document, in table order.
    pub fn shard_roles(&self) -> impl Iterator<Item = (TextureRole, &str)> + '_ {
        self.suffixes
            .iter()
            .filter(|suffix| !suffix.alias && suffix.role != TextureRole::Identity)
            .map(|suffix| (suffix.role, suffix.token.as_str()))
    }

    /// Classify a bare file name.
    ///
    /// Returns `None` when the extension is not recognized. A stem whose last
    /// underscore segment is not a known token is an identity texture named by
    /// the whole stem.
    pub fn classify(&self, file_name: &str) -> Option<Classification> {
        let (stem, ext) = split_extension(file_name)?;
        if stem.is_empty() || !ext.eq_ignore_ascii_case(&self.extension) {
            return None;
        }

        if let Some((prefix, token)) = stem.rsplit_once('_') {
            if !prefix.is_empty() {
                if let Some(suffix) = self.role_for_token(token) {
                    return Some(Classification {
                        stem: prefix.to_string(),
                        role: suffix.role,
                        alias: suffix.alias,
                    });
                }
            }
        }

        Some(Classification {
            stem: stem.to_string(),
            role: TextureRole::Identity,
            alias: false,
        })
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::remix()
    }
}

fn split_extension(file_name: &str) -> Option<(&str, &str)> {
    file_name.rsplit_once('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_plain_identity() {
        let table = RoleTable::remix();
        let class = table.classify("wood.dds").unwrap();
        assert_eq!(class.stem, "wood");
        assert_eq!(class.role, TextureRole::Identity);
        assert!(!class.alias);
    }

    #[test]
    fn test_classify_role_suffixes() {
        let table = RoleTable::remix();
        let cases = [
            ("wood_normal.dds", TextureRole::Normal),
            ("wood_emissive.dds", TextureRole::Emissive),
            ("wood_metallic.dds", TextureRole::Metallic),
            ("wood_rough.dds", TextureRole::Rough),
        ];
        for (name, role) in cases {
            let class = table.classify(name).unwrap();
            assert_eq!(class.stem, "wood", "{name}");
            assert_eq!(class.role, role, "{name}");
        }
    }

    #[test]
    fn test_classify_splits_on_last_underscore() {
        let table = RoleTable::remix();
        let class = table.classify("old_oak_plank_normal.dds").unwrap();
        assert_eq!(class.stem, "old_oak_plank");
        assert_eq!(class.role, TextureRole::Normal);
    }

    #[test]
    fn test_classify_unknown_suffix_is_identity() {
        let table = RoleTable::remix();
        let class = table.classify("old_oak.dds").unwrap();
        assert_eq!(class.stem, "old_oak");
        assert_eq!(class.role, TextureRole::Identity);
    }

    #[test]
    fn test_classify_diffuse_alias() {
        let table = RoleTable::remix();
        let class = table.classify("wood_diffuse.dds").unwrap();
        assert_eq!(class.stem, "wood");
        assert_eq!(class.role, TextureRole::Identity);
        assert!(class.alias);
    }

    #[test]
    fn test_classify_rejects_other_extensions() {
        let table = RoleTable::remix();
        assert!(table.classify("wood.png").is_none());
        assert!(table.classify("mod.usda").is_none());
        assert!(table.classify("README").is_none());
        assert!(table.classify(".dds").is_none());
        assert!(table.classify("WOOD.DDS").is_some());
    }

    #[test]
    fn test_bare_suffix_is_identity() {
        let table = RoleTable::remix();
        let class = table.classify("_normal.dds").unwrap();
        assert_eq!(class.stem, "_normal");
        assert_eq!(class.role, TextureRole::Identity);
    }

    #[test]
    fn test_shard_roles_in_table_order() {
        let table = RoleTable::remix();
        let shards: Vec<_> = table.shard_roles().collect();
        assert_eq!(
            shards,
            vec![
                (TextureRole::Normal, "normal"),
                (TextureRole::Emissive, "emissive"),
                (TextureRole::Metallic, "metallic"),
                (TextureRole::Rough, "rough"),
            ]
        );
        assert_eq!(table.token_for_role(TextureRole::Identity), None);
        assert_eq!(table.token_for_role(TextureRole::Rough), Some("rough"));
    }

    #[test]
    fn test_custom_table() {
        let table = RoleTable::new("png").with_suffix("n", TextureRole::Normal);
        assert_eq!(table.classify("brick_n.png").unwrap().role, TextureRole::Normal);
        assert_eq!(
            table.classify("brick_normal.png").unwrap().role,
            TextureRole::Identity
        );
        assert!(table.classify("brick_n.dds").is_none());
    }
}
