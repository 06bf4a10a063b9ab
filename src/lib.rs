//! Release config resolution
//!
//! Aggregates release configuration contributions from an ordered list of
//! contribution roots and resolves, for a target release, the final value
//! of every declared build flag together with the provenance of each value.
//!
//! Typical use:
//! 1. [`ReleaseConfigs::read_release_config_maps`] loads every root and
//!    generates the bundle for a target release.
//! 2. [`ReleaseConfigs::write_artifact`] and friends write outputs.

pub mod alias;
pub mod configs;
pub mod dir_index;
pub mod error;
pub mod flag_artifact;
pub mod graph;
pub mod loader;
mod merge;
pub mod release_config;
pub mod settings;
pub mod walk;

pub use alias::AliasTable;
pub use configs::{LoadedConfigMap, ReleaseConfigs};
pub use dir_index::DirectoryIndex;
pub use error::{ReleaseConfigError, Result};
pub use flag_artifact::{FlagArtifact, FlagArtifacts, RELEASE_ACONFIG_VALUE_SETS};
pub use release_config::{ReleaseConfig, FALLBACK_RELEASE, ROOT_RELEASE};
pub use settings::{default_map_paths, Settings, SettingsError};

pub use rc_records::Format;
