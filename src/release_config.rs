//! Per-release accumulated state.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use rc_records::{FlagValue, ReleaseConfigArtifact};

use crate::flag_artifact::FlagArtifacts;

/// Name of the release every other release implicitly inherits from, when
/// declared.
pub const ROOT_RELEASE: &str = "root";

/// Release substituted for a missing target when missing targets are allowed.
pub const FALLBACK_RELEASE: &str = "trunk_staging";

/// A flag value record and where it was read from.
#[derive(Debug, Clone)]
pub struct FlagValueSource {
    pub path: PathBuf,
    pub value: FlagValue,
}

/// One root's contribution to a release.
#[derive(Debug, Clone)]
pub struct ReleaseConfigContribution {
    /// Path of the `release_configs/<NAME>.toml` record.
    pub path: PathBuf,

    /// Rank of the contributing root.
    pub declaration_rank: usize,

    pub record: rc_records::ReleaseConfig,

    /// Flag values, in walk order.
    pub flag_values: Vec<FlagValueSource>,
}

/// Output of flattening one release.
#[derive(Debug, Clone)]
pub struct FlattenedRelease {
    /// Every flag, redacted ones included.
    pub flag_artifacts: FlagArtifacts,

    /// Every release this one descends from, directly or transitively.
    pub ancestors: BTreeSet<String>,

    pub artifact: ReleaseConfigArtifact,
}

/// A release config, accumulated across every root that contributes to it.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    pub name: String,

    /// Aliases resolving to this release.
    pub other_names: Vec<String>,

    /// Inherited releases, first-seen order, without duplicates.
    pub inherit_names: Vec<String>,

    /// Rank of the first root that contributed to this release.
    pub declaration_rank: usize,

    /// Releases that advance into this one.
    pub prior_stages: BTreeSet<String>,

    /// Contributions in load order.
    pub contributions: Vec<ReleaseConfigContribution>,

    pub aconfig_flags_only: bool,

    pub files_used: BTreeSet<PathBuf>,

    /// Set once the release has been flattened.
    pub flattened: Option<FlattenedRelease>,
}

impl ReleaseConfig {
    pub fn new(name: &str, declaration_rank: usize) -> Self {
        Self {
            name: name.to_string(),
            other_names: Vec::new(),
            inherit_names: Vec::new(),
            declaration_rank,
            prior_stages: BTreeSet::new(),
            contributions: Vec::new(),
            aconfig_flags_only: false,
            files_used: BTreeSet::new(),
            flattened: None,
        }
    }

    /// Append inherited names not already present.
    pub fn merge_inherits(&mut self, inherits: &[String]) {
        let mut seen: HashSet<String> = self.inherit_names.iter().cloned().collect();
        for name in inherits {
            if seen.insert(name.clone()) {
                self.inherit_names.push(name.clone());
            }
        }
    }

    /// Fold one root's contribution into this release.
    pub fn add_contribution(&mut self, contribution: ReleaseConfigContribution) {
        self.merge_inherits(&contribution.record.inherits);
        self.prior_stages
            .extend(contribution.record.prior_stages.iter().cloned());
        if contribution.record.aconfig_flags_only {
            self.aconfig_flags_only = true;
        }
        self.files_used.insert(contribution.path.clone());
        self.files_used
            .extend(contribution.flag_values.iter().map(|fv| fv.path.clone()));
        self.contributions.push(contribution);
    }

    /// The flattened artifact, once generated.
    pub fn artifact(&self) -> Option<&ReleaseConfigArtifact> {
        self.flattened.as_ref().map(|f| &f.artifact)
    }

    /// Flattened flag state, once generated.
    pub fn flag_artifacts(&self) -> Option<&FlagArtifacts> {
        self.flattened.as_ref().map(|f| &f.flag_artifacts)
    }

    /// Releases this one descends from, once generated.
    pub fn ancestors(&self) -> Option<&BTreeSet<String>> {
        self.flattened.as_ref().map(|f| &f.ancestors)
    }
}
