//! On-disk configuration for the `indexwatch` binary.
//!
//! Stored as RON, by default `./indexwatch.ron`. A missing file means
//! defaults; the API token may also come from `INDEXWATCH_API_TOKEN`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexwatch_core::{
    RetryPolicy, SlotSettings, DEBOUNCE_WINDOW, LONG_DURATION, MAX_RETRY_INTERVAL, POLL_INTERVAL,
    SHORT_DURATION,
};
use indexwatch_engine::{ClientSettings, PollSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use watch_logging::watch_info;

pub const DEFAULT_CONFIG_FILE: &str = "indexwatch.ron";
pub const TOKEN_ENV: &str = "INDEXWATCH_API_TOKEN";

const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/console/api";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("api_base_url {value:?} is not a valid url: {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure handling for status polling. The defaults retry forever at the
/// poll interval; setting `backoff_factor` above 1 backs off up to
/// `max_interval_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub backoff_factor: u32,
    pub max_interval_ms: u64,
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_factor: 1,
            max_interval_ms: MAX_RETRY_INTERVAL.as_millis() as u64,
            max_consecutive_failures: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub poll_interval_ms: u64,
    pub retry: RetryConfig,
    pub debounce_ms: u64,
    pub short_duration_ms: u64,
    pub long_duration_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            poll_interval_ms: POLL_INTERVAL.as_millis() as u64,
            retry: RetryConfig::default(),
            debounce_ms: DEBOUNCE_WINDOW.as_millis() as u64,
            short_duration_ms: SHORT_DURATION.as_millis() as u64,
            long_duration_ms: LONG_DURATION.as_millis() as u64,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl WatchConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                watch_info!("no config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: Self = ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        config.validate()?;
        watch_info!("loaded config from {:?}", path);
        Ok(config)
    }

    /// A non-empty token from the environment wins over the file.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            self.api_token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        if self.retry.backoff_factor == 0 {
            return Err(ConfigError::Invalid("retry.backoff_factor must be at least 1".into()));
        }
        if self.retry.max_consecutive_failures == Some(0) {
            return Err(ConfigError::Invalid(
                "retry.max_consecutive_failures must be at least 1".into(),
            ));
        }
        self.base_url().map(|_| ())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_base_url).map_err(|source| ConfigError::InvalidUrl {
            value: self.api_base_url.clone(),
            source,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            backoff_factor: self.retry.backoff_factor,
            max_interval: Duration::from_millis(self.retry.max_interval_ms),
            max_consecutive_failures: self.retry.max_consecutive_failures,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            retry: self.retry_policy(),
        }
    }

    pub fn slot_settings(&self) -> SlotSettings {
        SlotSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            short_duration: Duration::from_millis(self.short_duration_ms),
            long_duration: Duration::from_millis(self.long_duration_ms),
        }
    }

    pub fn client_settings(&self) -> Result<ClientSettings, ConfigError> {
        let mut settings = ClientSettings::new(self.base_url()?);
        settings.api_token = self.api_token.clone();
        settings.request_timeout = Duration::from_millis(self.request_timeout_ms);
        Ok(settings)
    }

    /// Pretty RON with the token masked, for display.
    pub fn to_display_ron(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.api_token.is_some() {
            shown.api_token = Some("********".to_string());
        }
        ron::ser::to_string_pretty(&shown, ron::ser::PrettyConfig::new())
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}
