//! Contribution root precedence.
//!
//! Roots are ranked in load order; rank 0 has the lowest precedence. The
//! rank is the only signal used to break ties between roots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseConfigError, Result};

/// Ordered set of contribution roots.
#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    dirs: Vec<PathBuf>,
    ranks: HashMap<PathBuf, usize>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root, returning its rank. Registering a known root again
    /// returns the existing rank.
    pub fn register(&mut self, dir: impl Into<PathBuf>) -> usize {
        let dir = dir.into();
        if let Some(&rank) = self.ranks.get(&dir) {
            return rank;
        }
        let rank = self.dirs.len();
        self.ranks.insert(dir.clone(), rank);
        self.dirs.push(dir);
        rank
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.ranks.contains_key(dir)
    }

    /// Rank of the nearest registered root enclosing `path`.
    pub fn rank_of(&self, path: &Path) -> Result<usize> {
        path.ancestors()
            .find_map(|p| self.ranks.get(p).copied())
            .ok_or_else(|| ReleaseConfigError::DirectoryNotFound {
                path: path.to_path_buf(),
            })
    }

    /// Root registered at `rank`.
    pub fn dir(&self, rank: usize) -> Option<&Path> {
        self.dirs.get(rank).map(PathBuf::as_path)
    }

    /// All roots in rank order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}
