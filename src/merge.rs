//! Merge engine
//!
//! Flattens every release over its inheritance DAG. Each release is
//! resolved once: its parents first (in inherit-list order, later entries
//! override earlier ones), then its own contributions in rank order. The
//! chain of releases currently being resolved is kept so that a release
//! reached again before it finishes is reported as a cycle.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rc_records::{ReleaseConfigArtifact, Tracepoint, Value, Workflow};

use crate::configs::ReleaseConfigs;
use crate::error::{ReleaseConfigError, Result};
use crate::flag_artifact::{FlagArtifacts, RELEASE_ACONFIG_VALUE_SETS};
use crate::release_config::{FlattenedRelease, ReleaseConfig, ROOT_RELEASE};

/// Memoized flattening over a fully loaded aggregate root.
pub(crate) struct Merger<'a> {
    configs: &'a ReleaseConfigs,
    has_root: bool,
    done: BTreeMap<String, FlattenedRelease>,
    in_progress: Vec<String>,
}

impl<'a> Merger<'a> {
    pub(crate) fn new(configs: &'a ReleaseConfigs) -> Self {
        Self {
            configs,
            has_root: configs.release_configs.contains_key(ROOT_RELEASE),
            done: BTreeMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Flatten every declared release.
    pub(crate) fn flatten_all(mut self) -> Result<BTreeMap<String, FlattenedRelease>> {
        let configs = self.configs;
        for name in configs.release_configs.keys() {
            self.flatten(name)?;
        }
        Ok(self.done)
    }

    fn flatten(&mut self, name: &str) -> Result<()> {
        if self.done.contains_key(name) {
            return Ok(());
        }
        if let Some(pos) = self.in_progress.iter().position(|n| n == name) {
            let mut cycle = self.in_progress[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(ReleaseConfigError::InheritanceCycle { cycle });
        }

        let configs = self.configs;
        let config = configs
            .release_configs
            .get(name)
            .ok_or_else(|| ReleaseConfigError::UnknownRelease {
                name: name.to_string(),
                trace: vec![name.to_string()],
            })?;

        self.in_progress.push(name.to_string());
        let result = self.build(config);
        self.in_progress.pop();

        let flattened = result?;
        tracing::debug!(
            release = %name,
            flags = flattened.flag_artifacts.len(),
            ancestors = flattened.ancestors.len(),
            "flattened release config"
        );
        self.done.insert(name.to_string(), flattened);
        Ok(())
    }

    fn build(&mut self, config: &ReleaseConfig) -> Result<FlattenedRelease> {
        let configs = self.configs;
        let is_root = config.name == ROOT_RELEASE;
        let mut flag_artifacts: FlagArtifacts = configs.flag_artifacts.clone();
        let mut ancestors = BTreeSet::new();

        let implicit_root = (self.has_root && !is_root).then(|| ROOT_RELEASE.to_string());
        let mut inherits = Vec::new();
        let mut seen = HashSet::new();
        for inherit in implicit_root.iter().chain(config.inherit_names.iter()) {
            if !seen.insert(inherit.as_str()) {
                continue;
            }
            inherits.push(inherit.clone());

            let parent_name = self.resolve_inherited(&config.name, inherit)?;
            self.flatten(&parent_name)?;
            let parent = self.done.get(&parent_name).ok_or_else(|| {
                ReleaseConfigError::UnknownInheritedRelease {
                    release: config.name.clone(),
                    inherited: inherit.clone(),
                }
            })?;

            for (flag_name, parent_fa) in &parent.flag_artifacts {
                if let Some(fa) = flag_artifacts.get_mut(flag_name) {
                    fa.inherit_from(parent_fa);
                }
            }
            ancestors.extend(parent.ancestors.iter().cloned());
            ancestors.insert(parent_name);
        }

        let mut contributions: Vec<_> = config.contributions.iter().collect();
        contributions.sort_by_key(|c| c.declaration_rank);

        let mut ranks = BTreeSet::new();
        for contrib in contributions {
            ranks.insert(contrib.declaration_rank);

            let value_sets = contrib.record.aconfig_value_sets.join(" ");
            if let Some(fa) = flag_artifacts.get_mut(RELEASE_ACONFIG_VALUE_SETS) {
                fa.value = Value::String(format!("{} {}", fa.value.string_value(), value_sets));
                fa.traces.push(Tracepoint {
                    source: contrib.path.display().to_string(),
                    value: Value::String(value_sets),
                });
            }

            if config.aconfig_flags_only && !contrib.flag_values.is_empty() {
                return Err(ReleaseConfigError::FlagOverridesNotAllowed {
                    release: config.name.clone(),
                });
            }

            for source in &contrib.flag_values {
                let name = &source.value.name;
                let fa = flag_artifacts.get_mut(name).ok_or_else(|| {
                    ReleaseConfigError::UndefinedFlag {
                        name: name.clone(),
                        path: source.path.clone(),
                    }
                })?;
                if let Some(declared) = fa.declaration_rank {
                    ranks.insert(declared);
                    if declared > contrib.declaration_rank {
                        return Err(ReleaseConfigError::ValueBeforeDeclaration {
                            name: name.clone(),
                            path: source.path.clone(),
                        });
                    }
                }
                if is_root && fa.declaration.workflow != Workflow::Manual {
                    return Err(ReleaseConfigError::RootNonManualFlag {
                        name: name.clone(),
                        path: source.path.clone(),
                    });
                }
                fa.update_value(&source.path, &source.value)?;
            }
        }

        let aconfig_value_sets = dedup_value_sets(&mut flag_artifacts);

        let directories = ranks
            .iter()
            .filter_map(|rank| configs.dir_index.dir(*rank))
            .map(|dir| dir.display().to_string())
            .collect();

        let artifact = ReleaseConfigArtifact {
            name: config.name.clone(),
            other_names: config.other_names.clone(),
            flag_artifacts: flag_artifacts
                .values()
                .filter(|fa| !fa.redacted)
                .map(|fa| fa.to_record())
                .collect(),
            aconfig_value_sets,
            inherits,
            directories,
            prior_stages: config.prior_stages.iter().cloned().collect(),
        };

        Ok(FlattenedRelease {
            flag_artifacts,
            ancestors,
            artifact,
        })
    }

    /// Resolve an inherited name (possibly an alias) to a declared release.
    fn resolve_inherited(&self, release: &str, inherit: &str) -> Result<String> {
        let (name, _) = self.configs.aliases.resolve(inherit)?;
        if self.configs.release_configs.contains_key(&name) {
            Ok(name)
        } else {
            Err(ReleaseConfigError::UnknownInheritedRelease {
                release: release.to_string(),
                inherited: inherit.to_string(),
            })
        }
    }
}

/// Collapse `RELEASE_ACONFIG_VALUE_SETS` to unique entries, first
/// occurrence wins. Returns the resulting list.
fn dedup_value_sets(flag_artifacts: &mut FlagArtifacts) -> Vec<String> {
    let Some(fa) = flag_artifacts.get_mut(RELEASE_ACONFIG_VALUE_SETS) else {
        return Vec::new();
    };
    let sets: Vec<String> = {
        let mut seen = HashSet::new();
        fa.value
            .string_value()
            .split_whitespace()
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    };
    fa.value = Value::String(sets.join(" "));
    sets
}
