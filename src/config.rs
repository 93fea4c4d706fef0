//! Configuration types for timetable-client

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Paths of the collaborator endpoints, relative to [`Config::base_url`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Multipart submission endpoint (default: "/send_admin_data")
    #[serde(default = "default_submit_path")]
    pub submit_path: String,

    /// Task-status endpoint; the task id is appended as a path segment (default: "/task_status")
    #[serde(default = "default_status_path")]
    pub status_path: String,

    /// Single-file preview endpoint (default: "/upload/")
    #[serde(default = "default_preview_path")]
    pub preview_path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            submit_path: default_submit_path(),
            status_path: default_status_path(),
            preview_path: default_preview_path(),
        }
    }
}

/// Long-poll settings
///
/// `interval * max_polls` bounds how long a run waits for the task; the defaults
/// give 30 minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between status queries (default: 2 seconds, milliseconds on the wire)
    #[serde(default = "default_poll_interval", with = "duration_ms_serde")]
    pub interval: Duration,

    /// Maximum number of status queries per run (default: 900)
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

impl PollingConfig {
    /// Longest a run can spend waiting between queries before it times out
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_polls
    }
}

/// Main configuration for the submission client and poller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Server origin, e.g. "http://localhost:4000"
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Endpoint paths
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Long-poll settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Per-request timeout (default: 120 seconds, seconds on the wire)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// File extensions accepted for the three input files, matched case-insensitively
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoints: EndpointConfig::default(),
            polling: PollingConfig::default(),
            request_timeout: default_request_timeout(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Config {
    /// Parse a JSON configuration document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&text)
    }

    /// Check settings that would otherwise fail much later
    pub fn validate(&self) -> Result<()> {
        self.base()?;
        if self.polling.interval.is_zero() {
            return Err(config_error("poll interval must be positive", "polling.interval"));
        }
        if self.polling.max_polls == 0 {
            return Err(config_error("poll ceiling must be at least 1", "polling.max_polls"));
        }
        if self.request_timeout.is_zero() {
            return Err(config_error("request timeout must be positive", "request_timeout"));
        }
        if self.allowed_extensions.is_empty() {
            return Err(config_error(
                "at least one file extension must be allowed",
                "allowed_extensions",
            ));
        }
        Ok(())
    }

    /// Parsed base URL
    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL {:?}: {e}", self.base_url),
            key: Some("base_url".to_string()),
        })
    }

    /// Whether `file_name` ends in one of the allowed extensions
    pub fn is_allowed_file_name(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.allowed_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()))
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_submit_path() -> String {
    "/send_admin_data".to_string()
}

fn default_status_path() -> String {
    "/task_status".to_string()
}

fn default_preview_path() -> String {
    "/upload/".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_max_polls() -> u32 {
    900
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".csv".to_string(), ".xlsx".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Millisecond Duration serialization helper
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
