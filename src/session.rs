use std::fs;
use std::path::{Path, PathBuf};

use collector_api::{CollectorClient, CollectorConfig, UploadError};
use session_log::{session_path, Sample, SessionHeader, SessionLog};

use crate::config::ExperimentConfig;
use crate::error::ExperimentError;

/// Outcome of the optional upload step that follows a closed session.
#[derive(Debug)]
pub enum UploadStatus {
    Skipped,
    Delivered { attempts: u32 },
    Failed(UploadError),
}

impl UploadStatus {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// `true` when the retry budget ran out.
    #[must_use]
    pub fn gave_up(&self) -> bool {
        matches!(self, Self::Failed(error) if error.gave_up())
    }
}

#[derive(Debug)]
pub struct SessionSummary {
    pub participant_id: String,
    pub path: PathBuf,
    pub sections: u32,
    pub upload: UploadStatus,
}

/// One participant's recording: the session log plus the upload that follows it.
///
/// The trial logic decides when sections start and samples arrive; this type
/// only forwards those calls and runs the close-then-upload sequence.
#[derive(Debug)]
pub struct ExperimentSession {
    log: SessionLog,
    collector: Option<CollectorConfig>,
}

impl ExperimentSession {
    pub fn start(config: &ExperimentConfig, participant_id: &str) -> Result<Self, ExperimentError> {
        fs::create_dir_all(&config.results_dir).map_err(|source| ExperimentError::ResultsDir {
            path: config.results_dir.clone(),
            source,
        })?;

        let path = session_path(&config.results_dir, participant_id);
        let header = SessionHeader::starting_now(participant_id, &config.experiment_name)?;
        let log = SessionLog::open_with_header(header, &path)?;

        Ok(Self {
            log,
            collector: config.upload_enabled.then(|| config.collector()),
        })
    }

    pub fn start_section(&mut self, info: &str) -> Result<u32, ExperimentError> {
        Ok(self.log.start_section(info)?)
    }

    pub fn write_sample(&mut self, sample: Sample) -> Result<(), ExperimentError> {
        Ok(self.log.write_sample(sample)?)
    }

    pub fn clear_buffer(&mut self) -> usize {
        self.log.clear_buffer()
    }

    #[must_use]
    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Closes the log and, when enabled, uploads it.
    ///
    /// A failed upload is reported in [`SessionSummary::upload`]; only log
    /// errors are returned as `Err`.
    ///
    /// The upload blocks on its own current-thread runtime, so this must not
    /// be called from inside an async context; hand it to a blocking task
    /// instead.
    pub fn finish(mut self) -> Result<SessionSummary, ExperimentError> {
        self.log.close()?;

        let participant_id = self.log.header().participant_id.clone();
        let path = self.log.path().to_path_buf();
        let upload = match self.collector {
            Some(collector) => upload_session(collector, &participant_id, &path),
            None => UploadStatus::Skipped,
        };

        Ok(SessionSummary {
            participant_id,
            path,
            sections: self.log.sections_started(),
            upload,
        })
    }
}

/// Ships a finished session file, blocking through every retry.
///
/// Must not be called from inside an async context.
pub fn upload_session(config: CollectorConfig, participant_id: &str, path: &Path) -> UploadStatus {
    let result = CollectorClient::new(config)
        .and_then(|client| client.upload_blocking(participant_id, path));

    match result {
        Ok(receipt) => UploadStatus::Delivered {
            attempts: receipt.attempts,
        },
        Err(error) => {
            tracing::error!(
                participant = participant_id,
                path = %path.display(),
                %error,
                "session upload failed"
            );
            UploadStatus::Failed(error)
        }
    }
}
