//! Contribution records.
//!
//! These are the inputs found beneath a contribution root. Optional fields
//! stay `Option` so the loader can tell "unset" apart from "set to the
//! default" before it fills in root-level defaults.

use serde::{Deserialize, Serialize};

use crate::value::{Value, Workflow};

/// The descriptor at the top of a contribution root
/// (`release_config_map.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseConfigMap {
    /// Aliases declared by this root.
    #[serde(default)]
    pub aliases: Vec<ReleaseAlias>,

    /// Free-form description of the root.
    #[serde(default)]
    pub description: Option<String>,

    /// Containers applied to flag declarations that name none.
    #[serde(default)]
    pub default_containers: Option<Vec<String>>,
}

/// An alternate name for a release config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAlias {
    pub name: String,
    pub target: String,
}

/// A flag declaration (`flag_declarations/<NAME>.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDeclaration {
    pub name: String,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Tracking bugs.
    #[serde(default)]
    pub bugs: Vec<String>,

    #[serde(default)]
    pub workflow: Workflow,

    /// Containers (partitions) this flag applies to.
    #[serde(default)]
    pub containers: Option<Vec<String>>,

    /// Default value.
    #[serde(default)]
    pub value: Option<Value>,

    /// Marks the default value as redacted. Never valid.
    #[serde(default)]
    pub redacted: bool,
}

/// A flag value assignment (`flag_values/<RELEASE>/<NAME>.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagValue {
    pub name: String,

    #[serde(default)]
    pub value: Value,

    /// Hide this flag from the release's artifacts.
    #[serde(default)]
    pub redacted: bool,
}

/// One root's contribution to a release config
/// (`release_configs/<NAME>.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseConfig {
    pub name: String,

    /// Release configs (or aliases) this release inherits from, lowest
    /// precedence first.
    #[serde(default)]
    pub inherits: Vec<String>,

    /// Aconfig value sets contributed to `RELEASE_ACONFIG_VALUE_SETS`.
    #[serde(default)]
    pub aconfig_value_sets: Vec<String>,

    /// Restrict this release to aconfig flags only.
    #[serde(default)]
    pub aconfig_flags_only: bool,

    /// Releases that advance into this one.
    #[serde(default)]
    pub prior_stages: Vec<String>,
}
