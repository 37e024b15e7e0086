use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Shortcut {binding} is already assigned to {conflict_with}")]
    Conflict {
        binding: String,
        conflict_with: String,
    },

    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Built-in template cannot be modified: {0}")]
    Immutable(String),

    #[error("No workspace is open")]
    NoWorkspace,

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Update error: {0}")]
    UpdateFailed(String),

    #[error("Operation not allowed while update is {0}")]
    InvalidState(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Attach the offending path to an IO failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code carried over the channel boundary.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::UnknownFeature(_) => "UNKNOWN_FEATURE",
            AppError::InvalidValue(_) => "INVALID_VALUE",
            AppError::Immutable(_) => "IMMUTABLE",
            AppError::NoWorkspace => "NO_WORKSPACE",
            AppError::EmptyQuery => "EMPTY_QUERY",
            AppError::Io { .. } => "IO",
            AppError::UpdateFailed(_) => "UPDATE_FAILED",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::UnknownChannel(_) => "UNKNOWN_CHANNEL",
            AppError::Unsupported(_) => "UNSUPPORTED",
            AppError::Json(_) => "INVALID_ARGUMENT",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(source: std::io::Error) -> Self {
        AppError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

/// Convenience type alias for Results with AppError
pub type Result<T> = std::result::Result<T, AppError>;
