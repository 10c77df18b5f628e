use miette::{Diagnostic, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Invalid directory: {path}")]
    #[diagnostic(
        code(generate::invalid_directory),
        help("Pass an existing directory, e.g. rtx-remix/mods/MyMod")
    )]
    InvalidDirectory { path: PathBuf },

    #[error("Invalid output name: {name}")]
    #[diagnostic(
        code(generate::invalid_output_name),
        help("Output names may only contain letters, digits, '_' and '-' (the .usda extension is added automatically)")
    )]
    InvalidOutputName {
        name: String,
        #[label("invalid output name")]
        span: Option<SourceSpan>,
    },

    #[error("Root layer not found: {path}")]
    #[diagnostic(
        code(stitch::root_missing),
        help("Sublayer stitching appends to the mod's existing root layer. Create it with the RTX Remix toolkit or set root_document in remix-mod.toml")
    )]
    RootLayerMissing { path: PathBuf },

    #[error("Identity collision on {key}: '{kept}' and '{dropped}'")]
    #[diagnostic(
        code(group::identity_collision),
        help("Two base names share the same mip 0 content. Rename or remove one, or rerun with --collision-policy keep-first")
    )]
    IdentityCollision {
        key: String,
        kept: String,
        dropped: String,
    },

    #[error("File not found: {path}")]
    #[diagnostic(
        code(file::not_found),
        help("Make sure the file exists and the path is correct")
    )]
    FileNotFound { path: PathBuf },

    #[error("Failed to build mod documents")]
    #[diagnostic(code(generate::build_failed))]
    BuildFailed {
        #[source]
        source: rmx_usda::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn invalid_directory(path: impl Into<PathBuf>) -> Self {
        Self::InvalidDirectory { path: path.into() }
    }

    pub fn invalid_output_name(name: String, span: Option<SourceSpan>) -> Self {
        Self::InvalidOutputName { name, span }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}

impl From<rmx_usda::Error> for CliError {
    fn from(error: rmx_usda::Error) -> Self {
        match error {
            rmx_usda::Error::InvalidTargetDir(path) => Self::invalid_directory(path),
            rmx_usda::Error::RootDocumentMissing(path) => Self::RootLayerMissing { path: path.into() },
            rmx_usda::Error::Texture(rmx_texture::Error::IdentityCollision { key, kept, dropped }) => {
                Self::IdentityCollision {
                    key: key.to_string(),
                    kept,
                    dropped,
                }
            }
            source => Self::BuildFailed { source },
        }
    }
}
