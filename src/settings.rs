//! Settings file (release_config.toml)
//!
//! Optional defaults for the command line tool. Precedence:
//! built-in defaults → settings file → CLI flags.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rc_records::{Format, RELEASE_CONFIG_MAP_FILE};

/// Default settings file name, looked up under the source tree top.
pub const SETTINGS_FILE: &str = "release_config.toml";

/// Contribution roots searched when none are given, in precedence order.
pub const DEFAULT_MAP_DIRS: [&str; 3] = [
    "build/release",
    "vendor/google_shared/build/release",
    "vendor/google/release",
];

/// Error types for settings operations
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse settings TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Settings validation error: {0}")]
    ValidationError(String),
}

/// Tool settings from release_config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Release config map paths, lowest precedence first
    #[serde(default)]
    pub maps: Vec<PathBuf>,

    /// TARGET_PRODUCT used in artifact file names
    pub product: Option<String>,

    /// Output directory for artifacts
    pub out_dir: Option<PathBuf>,

    /// Artifact formats to write
    #[serde(default)]
    pub formats: Vec<Format>,

    /// Fall back to trunk_staging for an unknown target release
    #[serde(default)]
    pub allow_missing: bool,
}

impl Settings {
    /// Load and parse settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Parse settings from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        for map in &self.maps {
            if map.as_os_str().is_empty() {
                return Err(SettingsError::ValidationError(
                    "Map paths cannot be empty".to_string(),
                ));
            }
        }

        if let Some(product) = &self.product {
            if product.is_empty() || product.contains(['/', '\\']) {
                return Err(SettingsError::ValidationError(format!(
                    "Invalid product '{}': must be a non-empty name without path separators",
                    product
                )));
            }
        }

        for (i, format) in self.formats.iter().enumerate() {
            if self.formats[..i].contains(format) {
                return Err(SettingsError::ValidationError(format!(
                    "Format '{}' listed more than once",
                    format
                )));
            }
        }

        Ok(())
    }
}

/// The default release config maps that exist under `top`.
pub fn default_map_paths(top: &Path) -> Vec<PathBuf> {
    DEFAULT_MAP_DIRS
        .iter()
        .map(|dir| top.join(dir).join(RELEASE_CONFIG_MAP_FILE))
        .filter(|path| path.is_file())
        .collect()
}
