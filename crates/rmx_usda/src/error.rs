//! Error types for document synthesis.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. Texture errors from [`rmx_texture`] convert via `From`.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or stitching override documents.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading the root layer, writing a document).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inspecting, hashing or grouping the source textures failed.
    #[error(transparent)]
    Texture(#[from] rmx_texture::Error),

    /// Moving a fully written temp file over its target failed.
    #[error("Failed to persist document: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// The texture directory does not exist or is not a directory.
    #[error("Invalid texture directory: {0}")]
    InvalidTargetDir(Utf8PathBuf),

    /// Sublayer stitching was requested but the root layer does not exist.
    #[error("Root layer not found: {0}")]
    RootDocumentMissing(Utf8PathBuf),

    /// The root layer could not be parsed far enough to edit its sublayers.
    #[error("Malformed layer: {0}")]
    MalformedLayer(String),
}
