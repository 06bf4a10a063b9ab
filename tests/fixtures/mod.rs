//! Contribution tree fixtures
//!
//! Builds release config contribution roots inside a temporary directory:
//! - `release_config_map.toml` (descriptor, aliases)
//! - `flag_declarations/<FLAG>.toml`
//! - `release_configs/<RELEASE>.toml`
//! - `flag_values/<RELEASE>/<FLAG>.toml`

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary source tree holding any number of contribution roots.
pub struct Tree {
    pub dir: TempDir,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a contribution root at `rel` with default container `system`.
    pub fn root(&self, rel: &str) -> Root {
        let root = Root {
            dir: self.path().join(rel),
        };
        root.map(&["system"], &[]);
        root
    }
}

/// One contribution root.
pub struct Root {
    pub dir: PathBuf,
}

impl Root {
    /// Path of the descriptor.
    pub fn map_path(&self) -> PathBuf {
        self.dir.join("release_config_map.toml")
    }

    /// Write a raw file under the root.
    pub fn write(&self, rel: &str, contents: &str) -> &Self {
        let path = self.dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    /// Rewrite the descriptor.
    pub fn map(&self, containers: &[&str], aliases: &[(&str, &str)]) -> &Self {
        let mut body = format!("default_containers = {}\n", toml_list(containers));
        for (name, target) in aliases {
            body.push_str(&format!(
                "\n[[aliases]]\nname = \"{}\"\ntarget = \"{}\"\n",
                name, target
            ));
        }
        self.write("release_config_map.toml", &body)
    }

    /// Declare a string flag with workflow `LAUNCH`.
    pub fn flag(&self, name: &str, default: &str) -> &Self {
        self.flag_with(name, default, "LAUNCH", "")
    }

    /// Declare a string flag with extra TOML lines.
    pub fn flag_with(&self, name: &str, default: &str, workflow: &str, extra: &str) -> &Self {
        let body = format!(
            "name = \"{}\"\nnamespace = \"build\"\nworkflow = \"{}\"\nvalue = {{ string_value = \"{}\" }}\n{}",
            name, workflow, default, extra
        );
        self.write(&format!("flag_declarations/{}.toml", name), &body)
    }

    /// Declare (or contribute to) a release.
    pub fn release(&self, name: &str, inherits: &[&str]) -> &Self {
        self.release_with(name, inherits, "")
    }

    pub fn release_with(&self, name: &str, inherits: &[&str], extra: &str) -> &Self {
        let body = format!(
            "name = \"{}\"\ninherits = {}\n{}",
            name,
            toml_list(inherits),
            extra
        );
        self.write(&format!("release_configs/{}.toml", name), &body)
    }

    /// Set a string value for `flag` in `release`.
    pub fn value(&self, release: &str, flag: &str, value: &str) -> &Self {
        self.value_raw(
            release,
            flag,
            &format!(
                "name = \"{}\"\nvalue = {{ string_value = \"{}\" }}\n",
                flag, value
            ),
        )
    }

    /// Write a flag value file with an arbitrary body.
    pub fn value_raw(&self, release: &str, flag: &str, body: &str) -> &Self {
        self.write(&format!("flag_values/{}/{}.toml", release, flag), body)
    }
}

fn toml_list(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("\"{}\"", i)).collect();
    format!("[{}]", quoted.join(", "))
}
