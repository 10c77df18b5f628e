//! USDA material override synthesis for RTX Remix texture mods.
//!
//! Takes the identity-keyed groups produced by [`rmx_texture`] and writes
//! `over "mat_<KEY>"` blocks that bind each role's texture to the matching
//! `AperturePBR_Opacity` shader input. Output is either one document or a base
//! document plus per-role shards, which can be stitched into the mod's root
//! layer as sublayers.
//!
//! Most callers only need [`ModBuilder`]; the lower-level pieces are exposed
//! for tools that bring their own grouping.

pub mod bindings;
pub mod builder;
pub mod document;
pub mod error;
pub mod sublayer;
pub mod synthesizer;
pub mod writer;

pub use bindings::{BindingValue, InputBinding, RoleBinding, ShaderBindings};
pub use builder::{ModBuildResult, ModBuilder, ModStage, DEFAULT_OUTPUT_NAME, DEFAULT_ROOT_DOCUMENT};
pub use document::{InputMetadata, InputValue, MaterialOverride, OverrideDocument, ShaderInput};
pub use error::{Error, Result};
pub use sublayer::{stitch_sublayers, RootLayer, StitchOutcome, SublayerEntry};
pub use synthesizer::{OutputMode, SynthesisOptions, SynthesisReport, Synthesizer, WrittenDocument};
pub use writer::{write_document, WriteOutcome};
