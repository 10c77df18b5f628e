//! Texture identity and role grouping for RTX Remix texture mods.
//!
//! This crate turns a directory of `.dds` textures that follow the
//! `basename[_<role>].dds` naming convention into identity-keyed asset groups:
//!
//! - **Header inspection**: locate the mip-0 payload from the fixed DDS header
//! - **Content identity**: xxHash3 the mip-0 bytes into a 16 digit hex key, so
//!   renamed copies of the same texture are recognized
//! - **Role grouping**: attach `_normal`, `_emissive`, `_metallic` and `_rough`
//!   variants to their base texture, with first-seen deduplication
//!
//! # Example
//!
//! ```no_run
//! use rmx_texture::{discover_files, DiscoverOptions, IdentityResolver, RoleGrouper, RoleTable};
//! use camino::Utf8Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Utf8Path::new("rtx-remix/mods/MyMod/textures");
//! let table = RoleTable::remix();
//! let files = discover_files(root, DiscoverOptions::default())?;
//! let resolver = IdentityResolver::new(root).with_hashing(true);
//!
//! let report = RoleGrouper::new(&table).group(&files, &resolver)?;
//! for group in &report.groups {
//!     println!("{} <- {}", group.key.material_name(), group.base_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod dds;
pub mod discover;
pub mod error;
pub mod group;
pub mod identity;
pub mod role;
pub mod texture;

pub use dds::DdsHeader;
pub use discover::{discover_files, DiscoverOptions};
pub use error::{Error, Result};
pub use group::{
    AssetGroup, CollisionPolicy, FilteredGroup, GroupReport, IdentityCollision, RoleGrouper,
};
pub use identity::{hash_file, hash_mip0, hash_payload, IdentityKey, IdentityResolver};
pub use role::{Classification, RoleSuffix, RoleTable, TextureRole};
pub use texture::TextureFile;
