use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::buffer::RecordBuffer;
use crate::error::SessionLogError;
use crate::schema::{Sample, SessionHeader, DEFAULT_EXPERIMENT_NAME};

const SECTION_INDENT: &str = "        ";
const FIELD_INDENT: &str = "            ";
const SAMPLE_INDENT: &str = "                ";
const SEPARATOR: &str = ",";

/// Where the writer sits in the document grammar.
///
/// `SectionClosedPendingNext` is the section-level pending separator: the next
/// section opening must be preceded by one. Inside an open section the same
/// role is played by [`SessionLog`]'s sample-level flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogState {
    HeaderWritten,
    SectionOpen,
    SectionClosedPendingNext,
    Closed,
}

impl fmt::Display for LogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::HeaderWritten => "awaiting its first section",
            Self::SectionOpen => "inside an open section",
            Self::SectionClosedPendingNext => "between sections",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Incremental writer for one participant's session document.
///
/// Text is only ever appended. Separators are written lazily in front of the
/// next item, so closing a level never has to take bytes back. The file holds
/// a valid document only after [`SessionLog::close`] returns `Ok`.
pub struct SessionLog {
    path: PathBuf,
    out: BufWriter<File>,
    header: SessionHeader,
    buffer: RecordBuffer,
    state: LogState,
    sections_started: u32,
    pending_sample_separator: bool,
}

impl SessionLog {
    /// Creates (or truncates) `path` and writes the header prefix, stamped now.
    pub fn open(participant_id: &str, path: &Path) -> Result<Self, SessionLogError> {
        let header = SessionHeader::starting_now(participant_id, DEFAULT_EXPERIMENT_NAME)?;
        Self::open_with_header(header, path)
    }

    pub fn open_with_header(header: SessionHeader, path: &Path) -> Result<Self, SessionLogError> {
        let path = path.to_path_buf();
        let file = File::create(&path)
            .map_err(|source| SessionLogError::io("creating session log", &path, source))?;

        let mut log = Self {
            path,
            out: BufWriter::new(file),
            header,
            buffer: RecordBuffer::default(),
            state: LogState::HeaderWritten,
            sections_started: 0,
            pending_sample_separator: false,
        };

        let prefix = format!(
            "{{\n    \"pid\": {},\n    \"exp\": {},\n    \"start_time\": {},\n    \"data\": [",
            log.encode_str(&log.header.participant_id)?,
            log.encode_str(&log.header.experiment_name)?,
            log.encode_str(&log.header.start_time)?,
        );
        log.write_text("writing session header", &prefix)?;
        log.flush_output("flushing session header")?;

        tracing::info!(
            path = %log.path.display(),
            participant = %log.header.participant_id,
            "opened session log"
        );
        Ok(log)
    }

    /// Opens a new section, closing the previous one first when it is still open.
    ///
    /// Returns the zero-based trial number assigned to the new section.
    pub fn start_section(&mut self, info: &str) -> Result<u32, SessionLogError> {
        match self.state {
            LogState::Closed => return Err(self.invalid_state("start a section")),
            LogState::SectionOpen => self.close_section()?,
            LogState::HeaderWritten | LogState::SectionClosedPendingNext => {}
        }

        let separator = if self.state == LogState::SectionClosedPendingNext {
            SEPARATOR
        } else {
            ""
        };
        let trial_num = self.sections_started;
        let opening = format!(
            "{separator}\n{SECTION_INDENT}{{\n\
             {FIELD_INDENT}\"trial_num\": \"{trial_num}\",\n\
             {FIELD_INDENT}\"trial_info\": {},\n\
             {FIELD_INDENT}\"data\": [",
            self.encode_str(info)?,
        );
        self.write_text("opening section", &opening)?;
        self.flush_output("opening section")?;

        self.buffer.clear();
        self.pending_sample_separator = false;
        self.state = LogState::SectionOpen;
        self.sections_started += 1;

        tracing::debug!(trial_num, info, "started section");
        Ok(trial_num)
    }

    /// Buffers `sample` for the open section; writes inline once the buffer overflows.
    ///
    /// Samples carrying NaN or infinite floats are rejected before buffering.
    pub fn write_sample(&mut self, sample: Sample) -> Result<(), SessionLogError> {
        if self.state != LogState::SectionOpen {
            return Err(self.invalid_state("write a sample"));
        }
        if let Some(field) = sample.non_finite_field() {
            return Err(SessionLogError::NonFiniteSample {
                path: self.path.clone(),
                field: field.to_owned(),
            });
        }

        if self.buffer.push(sample) {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Drops samples that have not been flushed yet. Returns how many were dropped.
    pub fn clear_buffer(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "cleared buffered samples");
        }
        dropped
    }

    /// Flushes pending samples, closes the open section and terminates the document.
    pub fn close(&mut self) -> Result<(), SessionLogError> {
        match self.state {
            LogState::Closed => return Err(self.invalid_state("close")),
            LogState::SectionOpen => self.close_section()?,
            LogState::HeaderWritten | LogState::SectionClosedPendingNext => {}
        }

        self.write_text("closing document", "\n    ]\n}\n")?;
        self.flush_output("closing document")?;
        self.out
            .get_ref()
            .sync_all()
            .map_err(|source| SessionLogError::io("syncing session log", &self.path, source))?;
        self.state = LogState::Closed;

        tracing::info!(
            path = %self.path.display(),
            sections = self.sections_started,
            "closed session log"
        );
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self) -> &SessionHeader {
        &self.header
    }

    #[must_use]
    pub fn state(&self) -> LogState {
        self.state
    }

    #[must_use]
    pub fn sections_started(&self) -> u32 {
        self.sections_started
    }

    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn flush_buffer(&mut self) -> Result<(), SessionLogError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut block = String::new();
        let mut written = 0usize;
        for sample in self.buffer.drain() {
            let encoded = serde_json::to_string(&sample)
                .map_err(|source| SessionLogError::json_serialize(&self.path, source))?;
            if self.pending_sample_separator {
                block.push_str(SEPARATOR);
            }
            block.push('\n');
            block.push_str(SAMPLE_INDENT);
            block.push_str(&encoded);
            self.pending_sample_separator = true;
            written += 1;
        }

        self.write_text("flushing samples", &block)?;
        self.flush_output("flushing samples")?;
        tracing::debug!(written, "flushed samples");
        Ok(())
    }

    fn close_section(&mut self) -> Result<(), SessionLogError> {
        self.flush_buffer()?;
        let closing = format!("\n{FIELD_INDENT}]\n{SECTION_INDENT}}}");
        self.write_text("closing section", &closing)?;
        self.pending_sample_separator = false;
        self.state = LogState::SectionClosedPendingNext;
        Ok(())
    }

    fn write_text(&mut self, operation: &'static str, text: &str) -> Result<(), SessionLogError> {
        self.out
            .write_all(text.as_bytes())
            .map_err(|source| SessionLogError::io(operation, &self.path, source))
    }

    fn flush_output(&mut self, operation: &'static str) -> Result<(), SessionLogError> {
        self.out
            .flush()
            .map_err(|source| SessionLogError::io(operation, &self.path, source))
    }

    fn encode_str(&self, value: &str) -> Result<String, SessionLogError> {
        serde_json::to_string(value)
            .map_err(|source| SessionLogError::json_serialize(&self.path, source))
    }

    fn invalid_state(&self, operation: &'static str) -> SessionLogError {
        SessionLogError::invalid_state(operation, &self.path, self.state)
    }
}

impl fmt::Debug for SessionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLog")
            .field("path", &self.path)
            .field("state", &self.state)
            .field("sections_started", &self.sections_started)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).expect("session log should be readable")
    }

    #[test]
    fn separators_are_only_written_in_front_of_later_items() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("log.json");
        let header = SessionHeader::new("P1", "exp", "2026-01-01T00:00:00Z");
        let mut log = SessionLog::open_with_header(header, &path).expect("log should open");

        log.start_section("a").expect("section should open");
        log.write_sample(Sample::new().with("x", 1))
            .expect("sample should buffer");
        log.close_section().expect("section should close");

        let text = read(&path);
        assert!(!text.trim_end().ends_with(','), "no dangling separator: {text}");
        assert_eq!(log.state(), LogState::SectionClosedPendingNext);

        log.start_section("b").expect("second section should open");
        assert!(read(&path).contains("},\n        {"));
    }

    #[test]
    fn open_writes_header_prefix_immediately() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("log.json");
        let header = SessionHeader::new("P'1", "exp", "2026-01-01T00:00:00Z");
        let log = SessionLog::open_with_header(header, &path).expect("log should open");

        assert_eq!(log.state(), LogState::HeaderWritten);
        assert_eq!(
            read(&path),
            "{\n    \"pid\": \"P'1\",\n    \"exp\": \"exp\",\n    \"start_time\": \"2026-01-01T00:00:00Z\",\n    \"data\": ["
        );
    }
}
