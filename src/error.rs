//! Error types for marginalia operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while extracting, formatting or exporting annotations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The file was recognized but could not be parsed.
    #[error("Extraction failed for {}: {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("Unknown extractor: {0}")]
    UnknownExtractor(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Command `{command}` failed: {message}")]
    Command { command: String, message: String },

    #[error("No library directory configured")]
    NoLibrary,

    /// The document is not stored in a library folder.
    #[error("Document has no folder: {0}")]
    NoFolder(String),
}

impl Error {
    pub(crate) fn extraction(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Extraction {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
