//! Session recorder for the shape-dependent tracking drawing study.
//!
//! The trial logic drives an [`ExperimentSession`]: it opens one log per
//! participant under the results directory, forwards section and sample
//! calls to [`session_log::SessionLog`], and on [`ExperimentSession::finish`]
//! closes the document and optionally ships it with
//! [`collector_api::CollectorClient`].
//!
//! Configuration is explicit: build an [`ExperimentConfig`] once (see
//! [`ExperimentConfig::from_env`]) and pass it to whatever needs it.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::ExperimentConfig;
pub use error::ExperimentError;
pub use session::{upload_session, ExperimentSession, SessionSummary, UploadStatus};

pub use collector_api;
pub use session_log;
pub use session_log::{Sample, SampleValue};
