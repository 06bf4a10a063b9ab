//! Release Config Records
//!
//! Schema-defined records read from contribution roots (config-map
//! descriptors, flag declarations, flag values, release contributions) and
//! the artifacts written after resolution, plus the codec that moves them
//! between files and memory.

pub mod artifact;
pub mod codec;
pub mod error;
pub mod records;
pub mod value;

pub use artifact::{
    FlagArtifact, FlagArtifacts, ReleaseConfigArtifact, ReleaseConfigsArtifact, Tracepoint,
};
pub use codec::{decode, encode, load_record, write_record, Format};
pub use error::RecordError;
pub use records::{FlagDeclaration, FlagValue, ReleaseAlias, ReleaseConfig, ReleaseConfigMap};
pub use value::{Value, Workflow};

/// File extension used by contribution records on disk.
pub const RECORD_EXTENSION: &str = "toml";

/// File name of the descriptor at the top of every contribution root.
pub const RELEASE_CONFIG_MAP_FILE: &str = "release_config_map.toml";
