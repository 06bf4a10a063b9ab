//! Record codec
//!
//! Reads and writes whole records in one call. The encoding is chosen from
//! the file extension:
//! - `.json`: pretty-printed JSON
//! - `.bin`: postcard binary
//! - `.toml`: human-readable TOML text

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use crate::error::RecordError;

/// Output encoding for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    #[serde(alias = "pb", alias = "bin")]
    Binary,
    #[serde(alias = "toml", alias = "textproto")]
    Text,
}

impl Format {
    /// All formats, in the order they are written.
    pub const ALL: [Format; 3] = [Format::Json, Format::Binary, Format::Text];

    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "bin",
            Self::Text => "toml",
        }
    }

    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, RecordError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("bin") => Ok(Self::Binary),
            Some("toml") => Ok(Self::Text),
            _ => Err(RecordError::UnknownFormat(path.to_path_buf())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Binary => write!(f, "binary"),
            Self::Text => write!(f, "text"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "binary" | "bin" | "pb" => Ok(Self::Binary),
            "text" | "toml" | "textproto" => Ok(Self::Text),
            other => Err(format!(
                "unknown format '{}': expected json, binary, or text",
                other
            )),
        }
    }
}

/// Encode a record. `path` is only used for error context.
pub fn encode<T: Serialize>(value: &T, format: Format, path: &Path) -> Result<Vec<u8>, RecordError> {
    match format {
        Format::Json => serde_json::to_vec_pretty(value).map_err(|source| RecordError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Format::Binary => postcard::to_stdvec(value).map_err(|source| RecordError::Binary {
            path: path.to_path_buf(),
            source,
        }),
        Format::Text => toml::to_string(value)
            .map(String::into_bytes)
            .map_err(|source| RecordError::TomlSer {
                path: path.to_path_buf(),
                source,
            }),
    }
}

/// Decode a record. `path` is only used for error context.
pub fn decode<T: DeserializeOwned>(bytes: &[u8], format: Format, path: &Path) -> Result<T, RecordError> {
    match format {
        Format::Json => serde_json::from_slice(bytes).map_err(|source| RecordError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Format::Binary => postcard::from_bytes(bytes).map_err(|source| RecordError::Binary {
            path: path.to_path_buf(),
            source,
        }),
        Format::Text => {
            let text = std::str::from_utf8(bytes).map_err(|e| RecordError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e)),
            })?;
            toml::from_str(text).map_err(|source| RecordError::Toml {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Load a record from a file.
pub fn load_record<T: DeserializeOwned>(path: &Path) -> Result<T, RecordError> {
    let format = Format::from_path(path)?;
    let bytes = fs::read(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes, format, path)
}

/// Write a record to a file, creating parent directories as needed.
pub fn write_record<T: Serialize>(path: &Path, value: &T) -> Result<(), RecordError> {
    let format = Format::from_path(path)?;
    let bytes = encode(value, format, path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| RecordError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, bytes).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })
}
