//! Release config resolution errors.
//!
//! Every failure is terminal for the resolution that raised it.

use std::path::PathBuf;

use rc_records::RecordError;

use crate::settings::SettingsError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReleaseConfigError>;

/// Errors raised while loading contribution roots or merging them.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseConfigError {
    #[error("Invalid release config map {path}: {reason}")]
    InvalidContributionRoot { path: PathBuf, reason: String },

    #[error("Flag declaration {path} has invalid container {container}")]
    InvalidContainer { path: PathBuf, container: String },

    #[error("Conflicting alias declarations for {name}: {existing} vs {target}")]
    ConflictingAlias {
        name: String,
        existing: String,
        target: String,
    },

    #[error("Duplicate definition of flag {name} in {path}")]
    DuplicateFlagDeclaration { name: String, path: PathBuf },

    #[error("{path}: {name} is a reserved build flag")]
    ReservedFlagName { name: String, path: PathBuf },

    #[error("Flag {name} may not be redacted by default ({path})")]
    DefaultMustNotBeRedacted { name: String, path: PathBuf },

    #[error("{path} incorrectly declares {kind} {name}")]
    NameMismatch {
        path: PathBuf,
        kind: &'static str,
        name: String,
    },

    #[error("Alias cycle detected: {}", .trace.join(" -> "))]
    AliasCycle { trace: Vec<String> },

    #[error("Alias {alias} points to non-existing config {target}")]
    DanglingAlias { alias: String, target: String },

    #[error("Alias {alias} is a declared release config")]
    AliasShadowsRelease { alias: String },

    #[error("Inheritance cycle detected: {}", .cycle.join(" -> "))]
    InheritanceCycle { cycle: Vec<String> },

    #[error("Release config {release} inherits unknown release config {inherited}")]
    UnknownInheritedRelease { release: String, inherited: String },

    #[error("Missing config {name}. Trace={}", .trace.join(" -> "))]
    UnknownRelease { name: String, trace: Vec<String> },

    #[error("Could not determine release config directory from {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Setting value for undefined flag {name} in {path}")]
    UndefinedFlag { name: String, path: PathBuf },

    #[error("Setting value for flag {name} not allowed in {path}: it is declared in a later directory")]
    ValueBeforeDeclaration { name: String, path: PathBuf },

    #[error("Release config {release} does not allow build flag overrides")]
    FlagOverridesNotAllowed { release: String },

    #[error("Setting value for non-MANUAL flag {name} is not allowed in {path}")]
    RootNonManualFlag { name: String, path: PathBuf },

    #[error("Flag {name}: {reason} ({path})")]
    ObsoleteFlag {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("No release config maps found")]
    NoMapsFound,

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}
