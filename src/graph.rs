//! Inheritance graph rendering (Graphviz DOT).

use std::collections::BTreeSet;
use std::path::Path;

use crate::configs::ReleaseConfigs;
use crate::error::Result;
use crate::release_config::{FALLBACK_RELEASE, ROOT_RELEASE};

const ACTIVE_FILL: &str = "#d2e3fc";
const WORKFLOW_FILL: &str = "#ceead6";
const PRIOR_STAGE_EDGE: &str = r##"[ style=dashed color="#81c995" ]"##;

impl ReleaseConfigs {
    /// Render releases, their inherit and alias edges, and progression
    /// edges as a DOT digraph. Body lines are sorted.
    pub fn inheritance_graph(&self) -> String {
        let active = self
            .artifact()
            .map(|a| a.release_config.name.as_str());
        let mut lines = Vec::new();
        let mut used_aliases = BTreeSet::new();

        for config in self.sorted_release_configs() {
            if config.name == ROOT_RELEASE {
                continue;
            }

            let mut inherits = Vec::new();
            for inherit in &config.inherit_names {
                if inherit == ROOT_RELEASE {
                    continue;
                }
                lines.push(format!(r#""{}" -> "{}""#, config.name, inherit));
                inherits.push(inherit.as_str());

                if let Some(target) = self.aliases.get(inherit) {
                    if used_aliases.insert(inherit.as_str()) {
                        lines.push(format!(r#""{}" -> "{}""#, inherit, target));
                        lines.push(format!(
                            r#""{}" [ label="{}\ncurrently: {}" shape=oval ]"#,
                            inherit, inherit, target
                        ));
                    }
                }
            }

            for prior in &config.prior_stages {
                lines.push(format!(
                    r#""{}" -> "{}" {}"#,
                    prior, config.name, PRIOR_STAGE_EDGE
                ));
            }

            let mut label = config.name.clone();
            if !inherits.is_empty() {
                label.push_str(&format!(r"\ninherits: {}", inherits.join(" ")));
            }
            if !config.other_names.is_empty() {
                label.push_str(&format!(r"\nother names: {}", config.other_names.join(" ")));
            }

            let fill = if Some(config.name.as_str()) == active {
                Some(ACTIVE_FILL)
            } else if is_workflow_stage(&config.name, &config.other_names) {
                Some(WORKFLOW_FILL)
            } else {
                None
            };
            let fill = fill
                .map(|color| format!(r#"fillcolor="{}" "#, color))
                .unwrap_or_default();
            lines.push(format!(r#""{}" [ label="{}" {}]"#, config.name, label, fill));
        }

        lines.sort();
        let mut out = vec![
            "digraph {".to_string(),
            "graph [ ratio=.5 ]".to_string(),
            "node [ shape=box style=filled fillcolor=white colorscheme=svg fontcolor=black ]"
                .to_string(),
        ];
        out.extend(lines);
        out.push("}".to_string());
        out.join("\n")
    }

    pub fn write_inheritance_graph(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.inheritance_graph()).map_err(|source| {
            rc_records::RecordError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::info!(path = %path.display(), "wrote inheritance graph");
        Ok(())
    }
}

/// `trunk`, `trunk_staging`, or anything known as `next` / `*_next`.
fn is_workflow_stage(name: &str, other_names: &[String]) -> bool {
    name == "trunk"
        || name == FALLBACK_RELEASE
        || other_names
            .iter()
            .any(|n| n == "next" || n.ends_with("_next"))
}
