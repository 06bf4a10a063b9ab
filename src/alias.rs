//! Release aliases.

use std::collections::{BTreeMap, HashSet};

use crate::error::{ReleaseConfigError, Result};

/// Alias name to target name.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an alias. Repeating an identical declaration is a no-op.
    pub fn declare(&mut self, name: &str, target: &str) -> Result<()> {
        if let Some(existing) = self.aliases.get(name) {
            if existing != target {
                return Err(ReleaseConfigError::ConflictingAlias {
                    name: name.to_string(),
                    existing: existing.clone(),
                    target: target.to_string(),
                });
            }
            return Ok(());
        }
        self.aliases.insert(name.to_string(), target.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// Aliases in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Follow alias links from `name` until reaching a name that is not an
    /// alias. Returns that name and every name visited, `name` first.
    pub fn resolve(&self, name: &str) -> Result<(String, Vec<String>)> {
        let mut current = name.to_string();
        let mut trace = vec![current.clone()];
        let mut seen: HashSet<String> = HashSet::from([current.clone()]);

        while let Some(target) = self.aliases.get(&current) {
            trace.push(target.clone());
            if !seen.insert(target.clone()) {
                return Err(ReleaseConfigError::AliasCycle { trace });
            }
            current = target.clone();
        }
        Ok((current, trace))
    }
}
