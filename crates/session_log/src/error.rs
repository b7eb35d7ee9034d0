use std::path::PathBuf;

use thiserror::Error;

use crate::writer::LogState;

#[derive(Debug, Error)]
pub enum SessionLogError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize sample for {path}: {source}")]
    JsonSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse session document at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("sample field '{field}' for {path} is not a finite number")]
    NonFiniteSample { path: PathBuf, field: String },

    #[error("cannot {operation} while session log {path} is {state}")]
    InvalidState {
        operation: &'static str,
        path: PathBuf,
        state: LogState,
    },

    #[error("failed to format current UTC timestamp as RFC3339: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl SessionLogError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn json_serialize(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonSerialize {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn invalid_state(
        operation: &'static str,
        path: impl Into<PathBuf>,
        state: LogState,
    ) -> Self {
        Self::InvalidState {
            operation,
            path: path.into(),
            state,
        }
    }

    /// Returns `true` for failures raised by the filesystem rather than by misuse.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
