use std::path::{Path, PathBuf};

pub const RESULTS_DIR: &str = "results";
pub const SESSION_FILE_PREFIX: &str = "shape-dependent-tracking-";

#[must_use]
pub fn results_root(cwd: &Path) -> PathBuf {
    cwd.join(RESULTS_DIR)
}

#[must_use]
pub fn sanitize_participant_for_filename(participant_id: &str) -> String {
    participant_id
        .trim()
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' | ' ' => '-',
            _ => c,
        })
        .collect()
}

#[must_use]
pub fn session_file_name(participant_id: &str) -> String {
    format!(
        "{SESSION_FILE_PREFIX}{}.json",
        sanitize_participant_for_filename(participant_id)
    )
}

#[must_use]
pub fn session_path(results_dir: &Path, participant_id: &str) -> PathBuf {
    results_dir.join(session_file_name(participant_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_file_name_replaces_path_hostile_characters() {
        assert_eq!(
            session_file_name(" P 1/a:b "),
            "shape-dependent-tracking-P-1-a-b.json"
        );
    }

    #[test]
    fn session_path_lives_under_results_dir() {
        let root = results_root(Path::new("/tmp/study"));
        assert_eq!(
            session_path(&root, "P7"),
            PathBuf::from("/tmp/study/results/shape-dependent-tracking-P7.json")
        );
    }
}
