//! Record codec errors.

use std::path::PathBuf;

/// Errors raised while reading or writing a record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to encode TOML for {path}: {source}")]
    TomlSer {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Binary encoding error in {path}: {source}")]
    Binary {
        path: PathBuf,
        #[source]
        source: postcard::Error,
    },

    #[error("Unknown record format for {0}")]
    UnknownFormat(PathBuf),
}
