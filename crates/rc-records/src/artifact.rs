//! Resolution artifacts.
//!
//! Written once all contribution roots are merged. Every collection here is
//! ordered, so the same input always encodes to the same bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::records::{FlagDeclaration, ReleaseConfigMap};
use crate::value::Value;

/// One value assignment and the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracepoint {
    /// Path of the record that set the value.
    pub source: String,
    pub value: Value,
}

/// A flag with its resolved value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagArtifact {
    pub flag_declaration: FlagDeclaration,

    /// Final value for the release this artifact belongs to.
    pub value: Value,

    /// Assignments in the order they were applied, oldest first.
    #[serde(default)]
    pub traces: Vec<Tracepoint>,
}

/// A list of flag artifacts, used for per-container output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagArtifacts {
    #[serde(default)]
    pub flag_artifacts: Vec<FlagArtifact>,
}

/// A fully flattened release config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseConfigArtifact {
    pub name: String,

    /// Aliases that resolve to this release.
    #[serde(default)]
    pub other_names: Vec<String>,

    /// Flags, sorted by name.
    #[serde(default)]
    pub flag_artifacts: Vec<FlagArtifact>,

    #[serde(default)]
    pub aconfig_value_sets: Vec<String>,

    /// Effective inheritance list, lowest precedence first.
    #[serde(default)]
    pub inherits: Vec<String>,

    /// Contribution roots involved in this release, in precedence order.
    #[serde(default)]
    pub directories: Vec<String>,

    #[serde(default)]
    pub prior_stages: Vec<String>,
}

impl ReleaseConfigArtifact {
    /// Look up a flag by name.
    pub fn flag(&self, name: &str) -> Option<&FlagArtifact> {
        self.flag_artifacts
            .binary_search_by(|fa| fa.flag_declaration.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.flag_artifacts[idx])
    }

    /// Resolved value of a flag, if the release carries it.
    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.flag(name).map(|fa| &fa.value)
    }
}

/// The bundle written as `all_release_configs-{product}.{ext}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseConfigsArtifact {
    /// The requested release.
    pub release_config: ReleaseConfigArtifact,

    /// Every other declared release, sorted by name.
    #[serde(default)]
    pub other_release_configs: Vec<ReleaseConfigArtifact>,

    /// Contribution root path to its raw descriptor.
    #[serde(default)]
    pub release_config_maps_map: BTreeMap<String, ReleaseConfigMap>,
}

impl ReleaseConfigsArtifact {
    /// Find a release in the bundle, target included.
    pub fn release(&self, name: &str) -> Option<&ReleaseConfigArtifact> {
        std::iter::once(&self.release_config)
            .chain(self.other_release_configs.iter())
            .find(|rc| rc.name == name)
    }
}
