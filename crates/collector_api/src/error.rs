use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum UploadError {
    InvalidEndpoint(String),
    InvalidHeader(String),
    ReadSession {
        path: PathBuf,
        source: std::io::Error,
    },
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    RetryExhausted {
        attempts: u32,
        status: Option<StatusCode>,
        last_error: Option<String>,
    },
    Runtime(String),
}

impl UploadError {
    /// Returns `true` for failures that count as a failed attempt and may be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status(..))
    }

    /// Returns `true` when the retry budget was spent without a successful upload.
    #[must_use]
    pub fn gave_up(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => write!(f, "invalid collector endpoint: {value}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::ReadSession { path, source } => {
                write!(f, "failed to read session file {}: {source}", path.display())
            }
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::RetryExhausted {
                attempts,
                status,
                last_error,
            } => {
                let status = status
                    .map(|status| status.as_u16().to_string())
                    .unwrap_or_else(|| "n/a".to_owned());
                write!(
                    f,
                    "upload gave up after {attempts} attempts (status: {status}, last_error: {last_error:?})"
                )
            }
            Self::Runtime(message) => write!(f, "upload runtime failure: {message}"),
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadSession { source, .. } => Some(source),
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for UploadError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Short human-readable reason for a rejected upload.
pub fn describe_rejection(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
