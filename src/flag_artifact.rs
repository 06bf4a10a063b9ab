//! Per-flag accumulated state.

use std::collections::BTreeMap;
use std::path::Path;

use rc_records::{FlagDeclaration, FlagValue, Tracepoint, Value, Workflow};

use crate::error::{ReleaseConfigError, Result};

/// Reserved flag that collects every release's aconfig value sets.
pub const RELEASE_ACONFIG_VALUE_SETS: &str = "RELEASE_ACONFIG_VALUE_SETS";

/// Namespace given to declarations that do not name one.
pub const UNKNOWN_NAMESPACE: &str = "android_UNKNOWN";

/// Containers a flag declaration may name.
pub const VALID_CONTAINERS: &[&str] = &["all", "product", "system", "system_ext", "vendor"];

pub fn is_valid_container(container: &str) -> bool {
    VALID_CONTAINERS.contains(&container)
}

/// Flag artifacts keyed by flag name.
pub type FlagArtifacts = BTreeMap<String, FlagArtifact>;

/// A declared flag and every value assigned to it so far.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagArtifact {
    pub declaration: FlagDeclaration,

    /// Rank of the root that declared the flag. `None` for built-in flags.
    pub declaration_rank: Option<usize>,

    /// Assignments, oldest first.
    pub traces: Vec<Tracepoint>,

    /// Current value.
    pub value: Value,

    pub redacted: bool,
}

impl FlagArtifact {
    /// Create an artifact with no assignments yet.
    pub fn new(declaration: FlagDeclaration, declaration_rank: Option<usize>) -> Self {
        Self {
            declaration,
            declaration_rank,
            traces: Vec::new(),
            value: Value::Unspecified,
            redacted: false,
        }
    }

    /// The built-in `RELEASE_ACONFIG_VALUE_SETS` flag.
    pub fn aconfig_value_sets() -> Self {
        let declaration = FlagDeclaration {
            name: RELEASE_ACONFIG_VALUE_SETS.to_string(),
            namespace: Some(UNKNOWN_NAMESPACE.to_string()),
            description: Some("Aconfig value sets assembled by release-config".to_string()),
            workflow: Workflow::Manual,
            containers: Some(
                ["system", "system_ext", "product", "vendor"]
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            ),
            value: Some(Value::Unspecified),
            ..Default::default()
        };
        Self::new(declaration, None)
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// True once anything beyond the declared default has been applied.
    pub fn has_assignment(&self) -> bool {
        self.traces.len() > 1
    }

    /// Apply an assignment read from `source`.
    pub fn update_value(&mut self, source: &Path, flag_value: &FlagValue) -> Result<()> {
        let trace = Tracepoint {
            source: source.display().to_string(),
            value: flag_value.value.clone(),
        };

        if flag_value.redacted {
            self.redacted = true;
            self.traces.push(Tracepoint {
                value: Value::Unspecified,
                ..trace
            });
            return Ok(());
        }

        if flag_value.value == Value::Obsolete(false) {
            return Err(self.obsolete_error(source, "cannot set obsolete=false"));
        }
        if self.value.is_obsolete() && !flag_value.value.is_obsolete() {
            return Err(self.obsolete_error(source, "cannot set a value after the flag is obsolete"));
        }

        self.traces.push(trace);
        self.value = flag_value.value.clone();
        Ok(())
    }

    fn obsolete_error(&self, source: &Path, reason: &str) -> ReleaseConfigError {
        ReleaseConfigError::ObsoleteFlag {
            name: self.name().to_string(),
            path: source.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Take over an ancestor's value, keeping the ancestor's provenance.
    pub fn inherit_from(&mut self, parent: &FlagArtifact) {
        if self.name() == RELEASE_ACONFIG_VALUE_SETS {
            let inherited = parent.value.string_value();
            if !inherited.is_empty() {
                self.traces.extend(parent.traces.iter().cloned());
                self.value = Value::String(
                    format!("{} {}", inherited, self.value.string_value())
                        .trim()
                        .to_string(),
                );
            }
        } else if parent.has_assignment() {
            self.traces.extend(parent.traces.iter().skip(1).cloned());
            self.value = parent.value.clone();
        }
    }

    pub fn to_record(&self) -> rc_records::FlagArtifact {
        rc_records::FlagArtifact {
            flag_declaration: self.declaration.clone(),
            value: self.value.clone(),
            traces: self.traces.clone(),
        }
    }

    pub fn to_record_without_traces(&self) -> rc_records::FlagArtifact {
        rc_records::FlagArtifact {
            flag_declaration: self.declaration.clone(),
            value: self.value.clone(),
            traces: Vec::new(),
        }
    }
}
