//! Error types for texture inspection and grouping.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. `std::io::Error`, `binrw::Error` and `walkdir::Error` convert
//! automatically via `From` impls.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::identity::IdentityKey;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while inspecting, hashing or grouping textures.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (opening or reading a texture).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The DDS header could not be decoded.
    #[error("DDS header error: {0}")]
    Header(#[from] binrw::Error),

    /// Directory traversal failed.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The input is shorter than the fixed 128-byte DDS header.
    #[error("Truncated DDS header: expected {expected} bytes, found {actual}")]
    TruncatedHeader { expected: u64, actual: u64 },

    /// The stream ends before the mip-0 range declared by its header.
    #[error("Truncated mip 0 payload: expected {expected} bytes, found {actual}")]
    TruncatedPayload { expected: u64, actual: u64 },

    /// Computing the identity of a specific texture file failed.
    #[error("Failed to resolve identity of '{path}': {source}")]
    Resolve {
        path: Utf8PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// The declared mip-0 size does not fit in a `u64`.
    #[error("Mip 0 size overflows for {width}x{height} ({bit_count} bpp)")]
    SizeOverflow {
        width: u32,
        height: u32,
        bit_count: u32,
    },

    /// Two different base names resolved to the same identity key and the
    /// collision policy forbids dropping one of them.
    #[error("Identity collision on {key}: '{kept}' and '{dropped}'")]
    IdentityCollision {
        key: IdentityKey,
        kept: String,
        dropped: String,
    },

    /// A discovered path is not below the scanned root directory.
    #[error("Path '{path}' is not inside '{root}'")]
    OutsideRoot {
        path: Utf8PathBuf,
        root: Utf8PathBuf,
    },

    /// A discovered path is not valid UTF-8.
    #[error("Non UTF-8 path: {0}")]
    NonUtf8Path(String),
}
