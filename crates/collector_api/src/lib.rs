//! Upload transport for finished session logs.
//!
//! A finished log is read as text, JSON-encoded into the `exp_data` field of
//! an [`UploadPayload`], and POSTed to the study collector. Failed attempts
//! are retried with exponential backoff (see [`RetryPolicy`]); once the budget
//! is spent the caller receives [`UploadError::RetryExhausted`].

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod retry;

pub use client::{CollectorClient, UploadReceipt};
pub use config::{CollectorConfig, DEFAULT_BUCKET, DEFAULT_COLLECTOR_URL};
pub use error::UploadError;
pub use payload::UploadPayload;
pub use retry::RetryPolicy;
