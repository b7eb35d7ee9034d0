//! Experiment configuration.
//!
//! Built once at startup and passed by reference to whatever needs it.
//! `SHAPE_TRACKING_CONFIG_PATH` may point at a UTF-8 JSON file:
//!
//! ```json
//! {
//!   "experiment_name": "shape-dependent-tracking-2025",
//!   "results_dir": "results",
//!   "upload": true,
//!   "collector_url": "https://collector.example/dev/",
//!   "bucket": "shape-dependent-tracking-2025",
//!   "timeout_sec": 30
//! }
//! ```
//!
//! Every field is optional. Unknown fields are rejected, strings must be
//! non-empty and `timeout_sec` must be > 0 when provided.
//! `SHAPE_TRACKING_UPLOAD=1` and `SHAPE_TRACKING_RESULTS_DIR` override the file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use collector_api::{CollectorConfig, DEFAULT_BUCKET, DEFAULT_COLLECTOR_URL};
use serde::Deserialize;
use session_log::{DEFAULT_EXPERIMENT_NAME, RESULTS_DIR};

use crate::error::ExperimentError;

pub const CONFIG_PATH_ENV_VAR: &str = "SHAPE_TRACKING_CONFIG_PATH";
pub const UPLOAD_ENV_VAR: &str = "SHAPE_TRACKING_UPLOAD";
pub const RESULTS_DIR_ENV_VAR: &str = "SHAPE_TRACKING_RESULTS_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentConfig {
    pub experiment_name: String,
    pub results_dir: PathBuf,
    pub upload_enabled: bool,
    pub collector_url: String,
    pub bucket: String,
    pub timeout: Option<Duration>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            experiment_name: DEFAULT_EXPERIMENT_NAME.to_owned(),
            results_dir: PathBuf::from(RESULTS_DIR),
            upload_enabled: false,
            collector_url: DEFAULT_COLLECTOR_URL.to_owned(),
            bucket: DEFAULT_BUCKET.to_owned(),
            timeout: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    experiment_name: Option<String>,
    results_dir: Option<PathBuf>,
    upload: Option<bool>,
    collector_url: Option<String>,
    bucket: Option<String>,
    timeout_sec: Option<u64>,
}

impl ExperimentConfig {
    pub fn from_env() -> Result<Self, ExperimentError> {
        let mut config = match env_string_opt(CONFIG_PATH_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if env_flag(UPLOAD_ENV_VAR) {
            config.upload_enabled = true;
        }
        if let Some(results_dir) = env_string_opt(RESULTS_DIR_ENV_VAR) {
            config.results_dir = PathBuf::from(results_dir);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ExperimentError> {
        let text = fs::read_to_string(path).map_err(|source| ExperimentError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    pub fn from_json(path: &Path, text: &str) -> Result<Self, ExperimentError> {
        let file: ConfigFile =
            serde_json::from_str(text).map_err(|source| ExperimentError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        let invalid = |message: String| ExperimentError::InvalidConfig {
            path: path.to_path_buf(),
            message,
        };

        let defaults = Self::default();
        let timeout = match file.timeout_sec {
            Some(0) => return Err(invalid("`timeout_sec` must be > 0".to_owned())),
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => None,
        };

        Ok(Self {
            experiment_name: non_empty("experiment_name", file.experiment_name, &invalid)?
                .unwrap_or(defaults.experiment_name),
            results_dir: match file.results_dir {
                Some(dir) if dir.as_os_str().is_empty() => {
                    return Err(invalid("`results_dir` must not be empty".to_owned()))
                }
                Some(dir) => dir,
                None => defaults.results_dir,
            },
            upload_enabled: file.upload.unwrap_or(defaults.upload_enabled),
            collector_url: non_empty("collector_url", file.collector_url, &invalid)?
                .unwrap_or(defaults.collector_url),
            bucket: non_empty("bucket", file.bucket, &invalid)?.unwrap_or(defaults.bucket),
            timeout,
        })
    }

    /// Transport settings for the uploader.
    #[must_use]
    pub fn collector(&self) -> CollectorConfig {
        let mut config = CollectorConfig::new(&self.collector_url).with_bucket(&self.bucket);
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }
}

fn non_empty(
    field: &str,
    value: Option<String>,
    invalid: &impl Fn(String) -> ExperimentError,
) -> Result<Option<String>, ExperimentError> {
    match value {
        Some(value) if value.trim().is_empty() => {
            Err(invalid(format!("`{field}` must not be empty")))
        }
        Some(value) => Ok(Some(value.trim().to_owned())),
        None => Ok(None),
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_match_study_constants() {
        let _lock = env_lock();
        let _g1 = set_env_guard(CONFIG_PATH_ENV_VAR, None);
        let _g2 = set_env_guard(UPLOAD_ENV_VAR, None);
        let _g3 = set_env_guard(RESULTS_DIR_ENV_VAR, None);

        let config = ExperimentConfig::from_env().expect("defaults should load");
        assert_eq!(config, ExperimentConfig::default());
        assert_eq!(config.experiment_name, "shape-dependent-tracking-2025");
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert!(!config.upload_enabled);
    }

    #[test]
    fn env_overrides_apply_on_top_of_file() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"bucket":"pilot","upload":false}"#).expect("config written");

        let path_text = path.display().to_string();
        let _g1 = set_env_guard(CONFIG_PATH_ENV_VAR, Some(&path_text));
        let _g2 = set_env_guard(UPLOAD_ENV_VAR, Some("1"));
        let _g3 = set_env_guard(RESULTS_DIR_ENV_VAR, Some("/tmp/study-results"));

        let config = ExperimentConfig::from_env().expect("config should load");
        assert_eq!(config.bucket, "pilot");
        assert!(config.upload_enabled);
        assert_eq!(config.results_dir, PathBuf::from("/tmp/study-results"));
    }

    #[test]
    fn from_json_reads_every_field() {
        let config = ExperimentConfig::from_json(
            Path::new("config.json"),
            r#"{
                "experiment_name": "pilot-study",
                "results_dir": "out",
                "upload": true,
                "collector_url": "http://127.0.0.1:8080/dev/",
                "bucket": "pilot-bucket",
                "timeout_sec": 30
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.experiment_name, "pilot-study");
        assert_eq!(config.results_dir, PathBuf::from("out"));
        assert!(config.upload_enabled);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));

        let collector = config.collector();
        assert_eq!(collector.endpoint, "http://127.0.0.1:8080/dev/");
        assert_eq!(collector.bucket, "pilot-bucket");
        assert_eq!(collector.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn from_json_rejects_unknown_fields() {
        let error = ExperimentConfig::from_json(Path::new("c.json"), r#"{"s3_flag": true}"#)
            .expect_err("unknown field must fail");
        assert!(matches!(error, ExperimentError::ConfigParse { .. }));
    }

    #[test]
    fn from_json_rejects_zero_timeout_and_blank_strings() {
        let zero = ExperimentConfig::from_json(Path::new("c.json"), r#"{"timeout_sec": 0}"#)
            .expect_err("zero timeout must fail");
        assert!(zero.to_string().contains("timeout_sec"));

        let blank = ExperimentConfig::from_json(Path::new("c.json"), r#"{"bucket": "  "}"#)
            .expect_err("blank bucket must fail");
        assert!(matches!(blank, ExperimentError::InvalidConfig { .. }));
    }
}
