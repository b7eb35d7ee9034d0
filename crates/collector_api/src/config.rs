use std::collections::BTreeMap;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Collector endpoint the study uploads finished sessions to.
pub const DEFAULT_COLLECTOR_URL: &str = "https://hss74dd1ed.execute-api.us-east-1.amazonaws.com/dev/";
/// Storage bucket named in every upload body.
pub const DEFAULT_BUCKET: &str = "shape-dependent-tracking-2025";
/// `User-Agent` the collector gateway expects from browser-like clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Transport configuration for collector uploads.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Full URL the session payload is POSTed to.
    pub endpoint: String,
    /// Value of the `bucket` field in the request body.
    pub bucket: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional per-attempt request timeout.
    pub timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COLLECTOR_URL.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl CollectorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
