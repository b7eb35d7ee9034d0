use std::path::Path;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};

use crate::config::CollectorConfig;
use crate::error::{describe_rejection, UploadError};
use crate::headers::build_headers;
use crate::payload::UploadPayload;
use crate::retry::is_accepted_status;

#[derive(Debug)]
pub struct CollectorClient {
    http: Client,
    config: CollectorConfig,
}

/// Proof of a stored upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReceipt {
    /// 1-based attempt that the collector accepted.
    pub attempts: u32,
}

impl CollectorClient {
    pub fn new(config: CollectorConfig) -> Result<Self, UploadError> {
        Url::parse(config.endpoint.trim())
            .map_err(|error| UploadError::InvalidEndpoint(format!("{}: {error}", config.endpoint)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(UploadError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        self.config.endpoint.trim()
    }

    pub fn build_headers(&self) -> Result<HeaderMap, UploadError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| UploadError::InvalidHeader(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    UploadError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        payload: &UploadPayload,
    ) -> Result<reqwest::RequestBuilder, UploadError> {
        let headers = self.build_headers()?;
        Ok(self.http.post(self.endpoint()).headers(headers).json(payload))
    }

    /// Reads a finished session file and wraps it for upload.
    pub fn payload_for_file(
        &self,
        participant_id: &str,
        path: &Path,
    ) -> Result<UploadPayload, UploadError> {
        let text = std::fs::read_to_string(path).map_err(|source| UploadError::ReadSession {
            path: path.to_path_buf(),
            source,
        })?;
        UploadPayload::from_session_text(participant_id, &self.config.bucket, &text)
            .map_err(UploadError::from)
    }

    /// Issues a single POST. Anything but HTTP 200 is a failed attempt.
    pub async fn send_once(&self, payload: &UploadPayload) -> Result<(), UploadError> {
        let response = self.build_request(payload)?.send().await?;
        let status = response.status();
        if is_accepted_status(status.as_u16()) {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(UploadError::Status(status, describe_rejection(status, &body)))
    }

    /// Uploads the session file at `path`, retrying with exponential backoff.
    ///
    /// Once every attempt has failed the result is
    /// [`UploadError::RetryExhausted`]; the caller decides whether to alert
    /// anyone.
    pub async fn upload(
        &self,
        participant_id: &str,
        path: &Path,
    ) -> Result<UploadReceipt, UploadError> {
        let payload = self.payload_for_file(participant_id, path)?;
        self.upload_payload(&payload).await
    }

    pub async fn upload_payload(
        &self,
        payload: &UploadPayload,
    ) -> Result<UploadReceipt, UploadError> {
        let policy = self.config.retry;
        let mut last_status = None;
        let mut last_error = None;

        for attempt in 1..=policy.max_attempts {
            let error = match self.send_once(payload).await {
                Ok(()) => {
                    tracing::info!(
                        subject = %payload.subject_id,
                        attempt,
                        "session data uploaded"
                    );
                    return Ok(UploadReceipt { attempts: attempt });
                }
                Err(error) if error.is_retryable() => error,
                Err(error) => return Err(error),
            };

            if let UploadError::Status(status, _) = &error {
                last_status = Some(*status);
            }
            let message = error.to_string();

            match policy.delay_after_attempt(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %message,
                        "upload attempt failed; retrying"
                    );
                    last_error = Some(message);
                    tokio::time::sleep(delay).await;
                }
                None => {
                    tracing::warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %message,
                        "upload attempt failed"
                    );
                    last_error = Some(message);
                }
            }
        }

        tracing::error!(
            subject = %payload.subject_id,
            attempts = policy.max_attempts,
            "max retries reached; upload failed"
        );
        Err(UploadError::RetryExhausted {
            attempts: policy.max_attempts,
            status: last_status,
            last_error,
        })
    }

    /// Blocking form of [`CollectorClient::upload`] for synchronous callers.
    ///
    /// Drives its own current-thread runtime, so it must not be called from
    /// inside an async context.
    pub fn upload_blocking(
        &self,
        participant_id: &str,
        path: &Path,
    ) -> Result<UploadReceipt, UploadError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                UploadError::Runtime(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(self.upload(participant_id, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;

    #[test]
    fn new_rejects_unparseable_endpoint() {
        let error = CollectorClient::new(CollectorConfig::new("not a url"))
            .expect_err("endpoint without scheme must fail");
        assert!(matches!(error, UploadError::InvalidEndpoint(_)));
    }

    #[test]
    fn missing_session_file_fails_before_any_attempt() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let client = CollectorClient::new(
            CollectorConfig::new("http://127.0.0.1:9/")
                .with_retry(RetryPolicy::new(5, std::time::Duration::from_millis(1))),
        )
        .expect("client");

        let error = client
            .upload_blocking("P1", &dir.path().join("absent.json"))
            .expect_err("missing file must fail");
        assert!(matches!(error, UploadError::ReadSession { .. }));
        assert!(!error.is_retryable());
    }
}
