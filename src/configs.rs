//! Aggregate root
//!
//! Owns every registry built while loading contribution roots and exposes
//! the resolution API. Build one per resolution; nothing here is shared
//! between runs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rc_records::{
    write_record, FlagArtifacts as FlagArtifactsRecord, FlagDeclaration, Format, ReleaseConfigMap,
    ReleaseConfigsArtifact, RELEASE_CONFIG_MAP_FILE,
};

use crate::alias::AliasTable;
use crate::dir_index::DirectoryIndex;
use crate::error::{ReleaseConfigError, Result};
use crate::flag_artifact::{FlagArtifact, FlagArtifacts, RELEASE_ACONFIG_VALUE_SETS};
use crate::merge::Merger;
use crate::release_config::{ReleaseConfig, FALLBACK_RELEASE};

/// A loaded contribution root.
#[derive(Debug, Clone)]
pub struct LoadedConfigMap {
    /// Path of the descriptor.
    pub path: PathBuf,
    pub dir: PathBuf,
    pub rank: usize,
    pub record: ReleaseConfigMap,
    /// Declarations found in this root, defaults applied.
    pub flag_declarations: Vec<FlagDeclaration>,
    /// Releases this root contributed to, in walk order.
    pub contributions: Vec<String>,
}

/// Every release config known to one resolution.
#[derive(Debug, Clone)]
pub struct ReleaseConfigs {
    pub(crate) config_maps: Vec<LoadedConfigMap>,
    pub(crate) aliases: AliasTable,
    pub(crate) flag_artifacts: FlagArtifacts,
    pub(crate) release_configs: BTreeMap<String, ReleaseConfig>,
    pub(crate) dir_index: DirectoryIndex,
    pub(crate) files_used: BTreeSet<PathBuf>,
    /// Substitute `trunk_staging` for a missing target.
    pub(crate) allow_missing: bool,
    pub(crate) artifact: Option<ReleaseConfigsArtifact>,
}

impl ReleaseConfigs {
    pub fn new(allow_missing: bool) -> Self {
        let mut flag_artifacts = FlagArtifacts::new();
        flag_artifacts.insert(
            RELEASE_ACONFIG_VALUE_SETS.to_string(),
            FlagArtifact::aconfig_value_sets(),
        );
        Self {
            config_maps: Vec::new(),
            aliases: AliasTable::new(),
            flag_artifacts,
            release_configs: BTreeMap::new(),
            dir_index: DirectoryIndex::new(),
            files_used: BTreeSet::new(),
            allow_missing,
            artifact: None,
        }
    }

    /// Load the listed roots in order and resolve `target_release`.
    ///
    /// Each entry names a root's descriptor (or the root directory itself).
    /// A root listed more than once is loaded at its first position only.
    pub fn read_release_config_maps(
        map_paths: &[PathBuf],
        target_release: &str,
        allow_missing: bool,
    ) -> Result<Self> {
        if map_paths.is_empty() {
            return Err(ReleaseConfigError::NoMapsFound);
        }

        let mut configs = Self::new(allow_missing);
        for map_path in map_paths {
            let dir = if map_path.is_dir() {
                map_path.as_path()
            } else {
                map_path.parent().unwrap_or_else(|| Path::new(""))
            };
            if configs.dir_index.contains(dir) {
                tracing::debug!(dir = %dir.display(), "skipping repeated release config map");
                continue;
            }
            configs.load_release_config_map(&dir.join(RELEASE_CONFIG_MAP_FILE))?;
        }

        configs.generate(target_release)?;
        Ok(configs)
    }

    /// Merge everything loaded so far and assemble the output bundle for
    /// `target_release`.
    pub fn generate(&mut self, target_release: &str) -> Result<&ReleaseConfigsArtifact> {
        self.attach_aliases()?;

        let flattened = Merger::new(self).flatten_all()?;
        for (name, release) in flattened {
            if let Some(config) = self.release_configs.get_mut(&name) {
                config.flattened = Some(release);
            }
        }

        let target = self.get_release_config(target_release)?;
        let release_config = target
            .artifact()
            .cloned()
            .ok_or_else(|| self.unknown_release(target_release))?;
        let other_release_configs = self
            .release_configs
            .values()
            .filter(|c| c.name != release_config.name)
            .filter_map(|c| c.artifact().cloned())
            .collect();
        let release_config_maps_map = self
            .config_maps
            .iter()
            .map(|m| (m.dir.display().to_string(), m.record.clone()))
            .collect();

        tracing::info!(
            target = %target_release,
            resolved = %release_config.name,
            releases = self.release_configs.len(),
            flags = self.flag_artifacts.len(),
            "generated release configs"
        );

        let bundle = ReleaseConfigsArtifact {
            release_config,
            other_release_configs,
            release_config_maps_map,
        };
        Ok(&*self.artifact.insert(bundle))
    }

    /// Check every alias and record it on the release it resolves to.
    fn attach_aliases(&mut self) -> Result<()> {
        let mut other_names: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (alias, target) in self.aliases.iter() {
            if self.release_configs.contains_key(alias) {
                return Err(ReleaseConfigError::AliasShadowsRelease {
                    alias: alias.to_string(),
                });
            }
            if !self.release_configs.contains_key(target) && !self.aliases.contains(target) {
                return Err(ReleaseConfigError::DanglingAlias {
                    alias: alias.to_string(),
                    target: target.to_string(),
                });
            }
            let (resolved, _) = self.aliases.resolve(alias)?;
            if !self.release_configs.contains_key(&resolved) {
                return Err(ReleaseConfigError::DanglingAlias {
                    alias: alias.to_string(),
                    target: resolved,
                });
            }
            other_names.entry(resolved).or_default().push(alias.to_string());
        }

        for config in self.release_configs.values_mut() {
            config.other_names = other_names.remove(&config.name).unwrap_or_default();
        }
        Ok(())
    }

    /// Find a release by name or alias.
    ///
    /// When missing releases are allowed, an unknown name resolves to
    /// `trunk_staging` if that release is declared.
    pub fn get_release_config(&self, name: &str) -> Result<&ReleaseConfig> {
        let (resolved, trace) = self.aliases.resolve(name)?;
        if let Some(config) = self.release_configs.get(&resolved) {
            return Ok(config);
        }
        if self.allow_missing {
            if let Some(config) = self.release_configs.get(FALLBACK_RELEASE) {
                tracing::warn!(
                    release = %name,
                    fallback = FALLBACK_RELEASE,
                    "release config not found, using fallback values"
                );
                return Ok(config);
            }
        }
        Err(ReleaseConfigError::UnknownRelease {
            name: resolved,
            trace,
        })
    }

    fn unknown_release(&self, name: &str) -> ReleaseConfigError {
        ReleaseConfigError::UnknownRelease {
            name: name.to_string(),
            trace: vec![name.to_string()],
        }
    }

    /// Releases sorted by name.
    pub fn sorted_release_configs(&self) -> Vec<&ReleaseConfig> {
        self.release_configs.values().collect()
    }

    /// Declared release names and every alias resolving to one, sorted.
    ///
    /// A target substituted by the missing-release fallback is not listed.
    pub fn all_release_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.release_configs.keys().cloned().collect();
        for (alias, _) in self.aliases.iter() {
            if let Ok((resolved, _)) = self.aliases.resolve(alias) {
                if self.release_configs.contains_key(&resolved) {
                    names.push(alias.to_string());
                }
            }
        }
        names.sort();
        names
    }

    /// The root that should receive a new value for `flag_name` in
    /// `release_name`: the highest ranked of the flag's declaring root, the
    /// release's first root, and the root of the flag's latest trace.
    pub fn flag_value_directory(&self, release_name: &str, flag_name: &str) -> Result<&Path> {
        let config = self.get_release_config(release_name)?;
        let flag = config
            .flag_artifacts()
            .and_then(|flags| flags.get(flag_name))
            .or_else(|| self.flag_artifacts.get(flag_name))
            .ok_or_else(|| ReleaseConfigError::UndefinedFlag {
                name: flag_name.to_string(),
                path: self
                    .dir_index
                    .dir(config.declaration_rank)
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            })?;

        let mut rank = config.declaration_rank;
        if let Some(declared) = flag.declaration_rank {
            rank = rank.max(declared);
        }
        if let Some(last) = flag.traces.last() {
            rank = rank.max(self.dir_index.rank_of(Path::new(&last.source))?);
        }
        self.dir_index
            .dir(rank)
            .ok_or_else(|| ReleaseConfigError::DirectoryNotFound {
                path: PathBuf::from(&flag.traces.last().map(|t| t.source.clone()).unwrap_or_default()),
            })
    }

    /// Per-container flag lists for a release, without traces.
    pub fn partition_build_flags(&self, release_name: &str) -> Result<BTreeMap<String, FlagArtifactsRecord>> {
        let config = self.get_release_config(release_name)?;
        let flags = config
            .flag_artifacts()
            .ok_or_else(|| self.unknown_release(release_name))?;

        let mut partitions: BTreeMap<String, FlagArtifactsRecord> = BTreeMap::new();
        for fa in flags.values().filter(|fa| !fa.redacted) {
            for container in fa.declaration.containers.iter().flatten() {
                partitions
                    .entry(container.clone())
                    .or_default()
                    .flag_artifacts
                    .push(fa.to_record_without_traces());
            }
        }
        Ok(partitions)
    }

    /// Write the bundle to `{out_dir}/all_release_configs-{product}.{ext}`.
    pub fn write_artifact(&self, out_dir: &Path, product: &str, format: Format) -> Result<PathBuf> {
        let artifact = self
            .artifact
            .as_ref()
            .ok_or_else(|| self.unknown_release("<not generated>"))?;
        let path = out_dir.join(format!(
            "all_release_configs-{}.{}",
            product,
            format.extension()
        ));
        write_record(&path, artifact)?;
        tracing::info!(path = %path.display(), %format, "wrote release configs artifact");
        Ok(path)
    }

    /// Write `{out_dir}/build_flags_{container}.{ext}` for the target release.
    pub fn write_partition_build_flags(&self, out_dir: &Path, format: Format) -> Result<Vec<PathBuf>> {
        let artifact = self
            .artifact
            .as_ref()
            .ok_or_else(|| self.unknown_release("<not generated>"))?;
        let mut written = Vec::new();
        for (container, flags) in self.partition_build_flags(&artifact.release_config.name)? {
            let path = out_dir.join(format!("build_flags_{}.{}", container, format.extension()));
            write_record(&path, &flags)?;
            written.push(path);
        }
        tracing::info!(count = written.len(), out_dir = %out_dir.display(), "wrote partition build flags");
        Ok(written)
    }

    /// The generated bundle, if `generate` has run.
    pub fn artifact(&self) -> Option<&ReleaseConfigsArtifact> {
        self.artifact.as_ref()
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Declared flags with their default values.
    pub fn flag_artifacts(&self) -> &FlagArtifacts {
        &self.flag_artifacts
    }

    /// A release by exact name (aliases are not followed).
    pub fn release(&self, name: &str) -> Option<&ReleaseConfig> {
        self.release_configs.get(name)
    }

    pub fn dir_index(&self) -> &DirectoryIndex {
        &self.dir_index
    }

    /// Every file read while loading.
    pub fn files_used(&self) -> &BTreeSet<PathBuf> {
        &self.files_used
    }

    /// Loaded roots, in load order.
    pub fn config_maps(&self) -> &[LoadedConfigMap] {
        &self.config_maps
    }
}
