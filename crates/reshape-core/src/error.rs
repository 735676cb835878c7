use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a failure, independent of where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceUnavailable,
    NotFound,
    MalformedDescriptor,
    IoFailure,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not fetch structure from '{url}': {source}")]
    SourceUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed descriptor '{origin}': {reason}")]
    MalformedDescriptor { origin: String, reason: String },

    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to walk directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MalformedDescriptor { .. } | Self::Json(_) => ErrorKind::MalformedDescriptor,
            Self::Io { .. } | Self::WalkDir(_) | Self::Config(_) | Self::ConfigDirNotFound => {
                ErrorKind::IoFailure
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
