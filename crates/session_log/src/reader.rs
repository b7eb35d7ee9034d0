use std::fs;
use std::path::Path;

use crate::error::SessionLogError;
use crate::schema::SessionDocument;

/// Parses a closed session log back into its typed document.
pub fn read_document(path: &Path) -> Result<SessionDocument, SessionLogError> {
    let text = fs::read_to_string(path)
        .map_err(|source| SessionLogError::io("reading session log", path, source))?;
    parse_document(path, &text)
}

pub(crate) fn parse_document(path: &Path, text: &str) -> Result<SessionDocument, SessionLogError> {
    serde_json::from_str::<SessionDocument>(text)
        .map_err(|source| SessionLogError::parse(path, source))
}
