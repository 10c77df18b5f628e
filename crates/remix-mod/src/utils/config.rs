//! Application configuration management utilities.

use camino::Utf8PathBuf;
use rmx_texture::CollisionPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "remix-mod.toml";

/// Defaults for `generate`, stored in remix-mod.toml. Command line flags
/// take precedence over every field.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Base name of generated documents.
    pub output: Option<String>,
    /// Root layer that shards are stitched into, relative to the target directory.
    pub root_document: Option<String>,
    pub reference_directory: Option<Utf8PathBuf>,
    pub recursive: Option<bool>,
    pub collision_policy: Option<CollisionPolicy>,
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns the default configuration file path (remix-mod.toml next to the executable).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Loads the application configuration.
/// Returns default configuration if file doesn't exist or cannot be parsed.
pub fn load_config() -> AppConfig {
    match default_config_path() {
        Some(path) => load_config_from(Path::new(path.as_str())),
        None => AppConfig::default(),
    }
}

pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| toml::from_str(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

/// Saves the application configuration next to the executable.
pub fn save_config(cfg: &AppConfig) -> io::Result<()> {
    if let Some(path) = default_config_path() {
        save_config_to(Path::new(path.as_str()), cfg)
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine config path",
        ))
    }
}

pub fn save_config_to(path: &Path, cfg: &AppConfig) -> io::Result<()> {
    let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
    fs::write(path, content)
}
