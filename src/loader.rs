//! Directory loader
//!
//! Folds one contribution root into the aggregate root:
//! 1. Descriptor (`release_config_map.toml`) and its default containers
//! 2. Aliases
//! 3. Flag declarations (`flag_declarations/`)
//! 4. Release contributions (`release_configs/`) and their flag values
//!    (`flag_values/<RELEASE>/`)
//!
//! Any failure aborts the load.

use std::path::{Path, PathBuf};

use rc_records::{load_record, FlagDeclaration, FlagValue, ReleaseConfigMap, Value};

use crate::configs::{LoadedConfigMap, ReleaseConfigs};
use crate::error::{ReleaseConfigError, Result};
use crate::flag_artifact::{is_valid_container, FlagArtifact, RELEASE_ACONFIG_VALUE_SETS, UNKNOWN_NAMESPACE};
use crate::release_config::{FlagValueSource, ReleaseConfig, ReleaseConfigContribution};
use crate::walk::{record_stem, walk_record_files};

impl ReleaseConfigs {
    /// Load the contribution root described by `path`, returning its rank.
    pub fn load_release_config_map(&mut self, path: &Path) -> Result<usize> {
        if !path.is_file() {
            return Err(invalid_root(path, "does not exist"));
        }
        let record: ReleaseConfigMap = load_record(path)?;
        let default_containers = match &record.default_containers {
            Some(containers) if !containers.is_empty() => containers.clone(),
            _ => return Err(invalid_root(path, "lacks default_containers")),
        };
        if let Some(bad) = default_containers.iter().find(|c| !is_valid_container(c)) {
            return Err(invalid_root(path, &format!("has invalid container {}", bad)));
        }

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let rank = self.dir_index.register(&dir);
        self.files_used.insert(path.to_path_buf());

        for alias in &record.aliases {
            self.aliases.declare(&alias.name, &alias.target)?;
        }

        let mut flag_declarations = Vec::new();
        walk_record_files(&dir, "flag_declarations", |decl_path| {
            let decl = self.load_flag_declaration(decl_path, rank, &default_containers)?;
            flag_declarations.push(decl);
            Ok(())
        })?;

        let mut contributions = Vec::new();
        walk_record_files(&dir, "release_configs", |rc_path| {
            let name = self.load_release_contribution(&dir, rc_path, rank)?;
            contributions.push(name);
            Ok(())
        })?;

        tracing::info!(
            dir = %dir.display(),
            rank,
            flags = flag_declarations.len(),
            releases = contributions.len(),
            aliases = record.aliases.len(),
            "loaded release config map"
        );

        self.config_maps.push(LoadedConfigMap {
            path: path.to_path_buf(),
            dir,
            rank,
            record,
            flag_declarations,
            contributions,
        });
        Ok(rank)
    }

    fn load_flag_declaration(
        &mut self,
        path: &Path,
        rank: usize,
        default_containers: &[String],
    ) -> Result<FlagDeclaration> {
        let mut decl: FlagDeclaration = load_record(path)?;

        match &decl.containers {
            Some(containers) if !containers.is_empty() => {
                if let Some(bad) = containers.iter().find(|c| !is_valid_container(c)) {
                    return Err(ReleaseConfigError::InvalidContainer {
                        path: path.to_path_buf(),
                        container: bad.clone(),
                    });
                }
            }
            _ => decl.containers = Some(default_containers.to_vec()),
        }
        if decl.namespace.is_none() {
            decl.namespace = Some(UNKNOWN_NAMESPACE.to_string());
        }
        if decl.value.is_none() {
            decl.value = Some(Value::Unspecified);
        }

        let name = decl.name.clone();
        if name == RELEASE_ACONFIG_VALUE_SETS {
            return Err(ReleaseConfigError::ReservedFlagName {
                name,
                path: path.to_path_buf(),
            });
        }

        if let Some(existing) = self.flag_artifacts.get(&name) {
            if existing.declaration != decl {
                return Err(ReleaseConfigError::DuplicateFlagDeclaration {
                    name,
                    path: path.to_path_buf(),
                });
            }
            self.files_used.insert(path.to_path_buf());
            tracing::debug!(path = %path.display(), flag = %name, rank, "skipping identical flag declaration");
            return Ok(decl);
        }

        let mut artifact = FlagArtifact::new(decl.clone(), Some(rank));
        artifact.update_value(
            path,
            &FlagValue {
                name: name.clone(),
                value: decl.value.clone().unwrap_or_default(),
                redacted: decl.redacted,
            },
        )?;
        if artifact.redacted {
            return Err(ReleaseConfigError::DefaultMustNotBeRedacted {
                name,
                path: path.to_path_buf(),
            });
        }
        self.flag_artifacts.insert(name, artifact);

        self.files_used.insert(path.to_path_buf());
        tracing::debug!(path = %path.display(), flag = %decl.name, rank, "loaded flag declaration");
        Ok(decl)
    }

    fn load_release_contribution(&mut self, dir: &Path, path: &Path, rank: usize) -> Result<String> {
        let record: rc_records::ReleaseConfig = load_record(path)?;
        let name = record.name.clone();
        if record_stem(path) != Some(name.as_str()) {
            return Err(ReleaseConfigError::NameMismatch {
                path: path.to_path_buf(),
                kind: "release config",
                name,
            });
        }

        let mut flag_values = Vec::new();
        walk_record_files(dir, Path::new("flag_values").join(&name), |fv_path| {
            flag_values.push(load_flag_value(fv_path)?);
            Ok(())
        })?;

        tracing::debug!(
            path = %path.display(),
            release = %name,
            rank,
            values = flag_values.len(),
            "loaded release config contribution"
        );

        self.files_used.insert(path.to_path_buf());
        self.files_used
            .extend(flag_values.iter().map(|fv| fv.path.clone()));

        let config = self
            .release_configs
            .entry(name.clone())
            .or_insert_with(|| ReleaseConfig::new(&name, rank));
        config.add_contribution(ReleaseConfigContribution {
            path: path.to_path_buf(),
            declaration_rank: rank,
            record,
            flag_values,
        });
        Ok(name)
    }
}

fn load_flag_value(path: &Path) -> Result<FlagValueSource> {
    let value: FlagValue = load_record(path)?;
    if record_stem(path) != Some(value.name.as_str()) {
        return Err(ReleaseConfigError::NameMismatch {
            path: path.to_path_buf(),
            kind: "flag value for",
            name: value.name,
        });
    }
    if value.name == RELEASE_ACONFIG_VALUE_SETS {
        return Err(ReleaseConfigError::ReservedFlagName {
            name: value.name,
            path: path.to_path_buf(),
        });
    }
    Ok(FlagValueSource {
        path: PathBuf::from(path),
        value,
    })
}

fn invalid_root(path: &Path, reason: &str) -> ReleaseConfigError {
    ReleaseConfigError::InvalidContributionRoot {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
