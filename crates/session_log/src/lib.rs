//! Incremental writer for drawing-study session documents.
//!
//! A [`SessionLog`] streams one participant's trials to disk while the
//! experiment runs, never holding the whole document in memory. The file is a
//! valid JSON document of the shape below only once [`SessionLog::close`]
//! succeeds; before that it is a prefix of it.
//!
//! ```text
//! {
//!     "pid": "...",
//!     "exp": "...",
//!     "start_time": "...",
//!     "data": [
//!         { "trial_num": "0", "trial_info": "...", "data": [ {sample}, ... ] },
//!         ...
//!     ]
//! }
//! ```

mod buffer;
mod error;
mod paths;
mod reader;
mod schema;
mod writer;

pub use buffer::{RecordBuffer, FLUSH_THRESHOLD};
pub use error::SessionLogError;
pub use paths::{results_root, session_file_name, session_path, RESULTS_DIR, SESSION_FILE_PREFIX};
pub use reader::read_document;
pub use schema::{
    Sample, SampleValue, SectionRecord, SessionDocument, SessionHeader, DEFAULT_EXPERIMENT_NAME,
};
pub use writer::{LogState, SessionLog};
