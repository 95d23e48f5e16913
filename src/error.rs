use serde::Serialize;
use std::path::PathBuf;

/// All errors that can occur while converting a project or relaying a chat.
#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("Missing configuration: {} must be set", .0.join(", "))]
    ConfigurationMissing(Vec<&'static str>),

    #[error("Invalid configuration: {key}={value:?}")]
    ConfigurationInvalid { key: &'static str, value: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Write error at {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for ConverterError {
    fn from(e: zip::result::ZipError) -> Self {
        ConverterError::InvalidArchive(e.to_string())
    }
}

impl From<reqwest::Error> for ConverterError {
    fn from(e: reqwest::Error) -> Self {
        ConverterError::Upstream(e.to_string())
    }
}

impl ConverterError {
    /// Wraps a filesystem failure with the path it happened at.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConverterError::Write {
            path: path.into(),
            source,
        }
    }
}

// The relay embeds errors in JSON bodies as plain strings.
impl Serialize for ConverterError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConverterError>;
