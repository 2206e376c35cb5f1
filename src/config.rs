use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use crate::toast::DEFAULT_TTL;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base: String,
    /// Directory holding `eventflex.db`. `None` means the platform data directory.
    pub data_dir: Option<PathBuf>,
    pub verify_poll: Duration,
    pub chat_poll: Duration,
    pub toast_ttl: Duration,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            data_dir: None,
            verify_poll: Duration::from_secs(5),
            chat_poll: Duration::from_secs(3),
            toast_ttl: DEFAULT_TTL,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let api_base = match get("EVENTFLEX_API_BASE") {
            Some(base) => validate_base(&base)?,
            None => {
                debug!(default = DEFAULT_API_BASE, "EVENTFLEX_API_BASE not set");
                defaults.api_base
            }
        };

        Ok(Self {
            api_base,
            data_dir: get("EVENTFLEX_DATA_DIR").map(PathBuf::from),
            verify_poll: duration(
                "EVENTFLEX_VERIFY_POLL_SECS",
                get("EVENTFLEX_VERIFY_POLL_SECS"),
                Duration::from_secs,
                defaults.verify_poll,
            )?,
            chat_poll: duration(
                "EVENTFLEX_CHAT_POLL_SECS",
                get("EVENTFLEX_CHAT_POLL_SECS"),
                Duration::from_secs,
                defaults.chat_poll,
            )?,
            toast_ttl: duration(
                "EVENTFLEX_TOAST_MS",
                get("EVENTFLEX_TOAST_MS"),
                Duration::from_millis,
                defaults.toast_ttl,
            )?,
            http_timeout: duration(
                "EVENTFLEX_HTTP_TIMEOUT_SECS",
                get("EVENTFLEX_HTTP_TIMEOUT_SECS"),
                Duration::from_secs,
                defaults.http_timeout,
            )?,
        })
    }

    pub fn with_api_base(mut self, base: &str) -> Result<Self, ConfigError> {
        self.api_base = validate_base(base)?;
        Ok(self)
    }
}

fn validate_base(base: &str) -> Result<String, ConfigError> {
    let base = base.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        Ok(base.to_string())
    } else {
        Err(ConfigError::Invalid {
            key: "EVENTFLEX_API_BASE",
            message: format!("'{base}' is not an http(s) URL"),
        })
    }
}

fn duration(
    key: &'static str,
    raw: Option<String>,
    unit: fn(u64) -> Duration,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        debug!(key, default_ms = default.as_millis() as u64, "using default");
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            key,
            message: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(unit(n)),
        Err(e) => Err(ConfigError::Invalid {
            key,
            message: format!("'{raw}': {e}"),
        }),
    }
}
