//! Exporter errors.

use thiserror::Error;

/// An error raised by an item exporter.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A record arrived whose type has no configured writer.
    #[error("no exporter configured for item type {0}")]
    UnknownItemType(String),
    /// Filesystem failure.
    #[error("io error on {path}: {source}")]
    Io {
        /// The file being written.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A record failed to serialize.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// A CSV row failed to encode.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
