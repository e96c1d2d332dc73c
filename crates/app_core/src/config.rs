use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/api";
const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the backend REST API, without a trailing slash.
    pub api_base: String,
    /// Directory used for durable key-value storage (tokens, cached
    /// profile). Consumed by `ApiClient::from_config`.
    pub data_dir: PathBuf,
    /// Per-attempt network timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Total attempts for a transiently failing request.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base unit for the exponential backoff between attempts, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config {
            api_base: DEFAULT_API_BASE.to_string(),
            data_dir: PathBuf::from(".bloodlink"),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        };

        if std::path::Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                match toml::from_str::<Config>(&content) {
                    Ok(file_config) => config = file_config,
                    Err(err) => log::warn!("Ignoring malformed {CONFIG_FILE_PATH}: {err}"),
                }
            }
        }

        // Override with environment variables if they exist
        if let Ok(api_base) = std::env::var("BLOODLINK_API_BASE") {
            config.api_base = api_base;
        }
        if let Ok(data_dir) = std::env::var("BLOODLINK_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(timeout) = std::env::var("BLOODLINK_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.trim().parse() {
                config.request_timeout_secs = secs;
            }
        }
        config
    }
}
