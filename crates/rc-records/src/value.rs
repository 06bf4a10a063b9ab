//! Flag values and workflow modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A flag value.
///
/// Serialized externally tagged, so a record reads
/// `value = { string_value = "on" }` or `value = "unspecified_value"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// No value has been given.
    #[default]
    #[serde(rename = "unspecified_value")]
    Unspecified,
    #[serde(rename = "string_value")]
    String(String),
    #[serde(rename = "bool_value")]
    Bool(bool),
    /// The flag is retired. Only `true` is a valid assignment.
    #[serde(rename = "obsolete")]
    Obsolete(bool),
}

impl Value {
    /// Create a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// The string payload, or "" for any other kind.
    pub fn string_value(&self) -> &str {
        match self {
            Self::String(s) => s,
            _ => "",
        }
    }

    /// The bool payload, if this is a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }

    pub fn is_obsolete(&self) -> bool {
        matches!(self, Self::Obsolete(true))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "<unspecified>"),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Obsolete(b) => write!(f, "obsolete={}", b),
        }
    }
}

/// How a flag's value advances between release stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Workflow {
    #[default]
    Unspecified,
    /// Boolean flag that advances with the release train.
    Launch,
    /// Value is managed by a prebuilt drop.
    Prebuilt,
    /// Value is only ever changed by hand.
    Manual,
}
