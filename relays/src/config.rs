use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_ONIONOO_URL: &str = "https://onionoo.torproject.org/details";

fn default_url() -> Url {
    Url::parse(DEFAULT_ONIONOO_URL).expect("default onionoo url is valid")
}

fn default_timestamp_file() -> PathBuf {
    PathBuf::from("timestamp")
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

/// Where and how the relay snapshot is fetched.
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct OnionooConfig {
    /// URL of the Onionoo details document
    #[serde(default = "default_url")]
    pub url: Url,
    /// File remembering the freshness token of the last successful run
    #[serde(default = "default_timestamp_file")]
    pub timestamp_file: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries per fetch on 429 and 5xx responses
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Backoff before retry n is `retry_base_delay_ms * 2^n`, at most ten minutes
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for OnionooConfig {
    fn default() -> Self {
        OnionooConfig {
            url: default_url(),
            timestamp_file: default_timestamp_file(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}
