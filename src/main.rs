use std::path::Path;
use std::process::ExitCode;

use shape_tracking::{logging, upload_session, ExperimentConfig, UploadStatus};

const USAGE: &str = "usage: shape_tracking upload <participant-id> <session-file>";

fn main() -> ExitCode {
    logging::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["upload", participant_id, file] => upload(participant_id, Path::new(file)),
        ["help"] | ["--help"] | ["-h"] => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}

fn upload(participant_id: &str, path: &Path) -> ExitCode {
    let config = match ExperimentConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::from(2);
        }
    };

    match upload_session(config.collector(), participant_id, path) {
        UploadStatus::Delivered { attempts } => {
            tracing::info!(attempts, path = %path.display(), "upload complete");
            ExitCode::SUCCESS
        }
        UploadStatus::Failed(error) => {
            eprintln!("upload failed: {error}");
            ExitCode::FAILURE
        }
        UploadStatus::Skipped => ExitCode::SUCCESS,
    }
}
