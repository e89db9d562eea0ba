//! Error types for cordova-config

use std::path::PathBuf;

/// Result type for cordova-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur reading or writing project documents
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse {format} in {path}: {message}")]
    Parse {
        format: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("{path} has no <{element}> root element")]
    MissingRoot {
        path: PathBuf,
        element: &'static str,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Fs(#[from] cordova_fs::Error),
}

impl Error {
    pub fn parse(format: &'static str, path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            format,
            path: path.into(),
            message: message.to_string(),
        }
    }
}
