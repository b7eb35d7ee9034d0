use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;

/// Request body accepted by the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub subject_id: String,
    pub bucket: String,
    /// The session file text as a JSON string literal, carried as a string field.
    pub exp_data: String,
}

impl UploadPayload {
    /// Wraps finished session text for upload.
    ///
    /// The collector decodes `exp_data` once more after decoding the body, so
    /// the text is JSON-encoded before it is embedded.
    pub fn from_session_text(
        subject_id: impl Into<String>,
        bucket: impl Into<String>,
        session_text: &str,
    ) -> Result<Self, JsonError> {
        Ok(Self {
            subject_id: subject_id.into(),
            bucket: bucket.into(),
            exp_data: serde_json::to_string(session_text)?,
        })
    }

    /// Recovers the original session text from `exp_data`.
    pub fn session_text(&self) -> Result<String, JsonError> {
        serde_json::from_str(&self.exp_data)
    }
}
