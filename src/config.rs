//! Client configuration
//!
//! Replaces a process-wide default base URI: every client is constructed from
//! an explicit [`ClientConfig`].

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URI: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Observed poll budget of the job status loop
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 100;

pub const ENV_BASE_URI: &str = "TRACKER_BASE_URI";
pub const ENV_TIMEOUT_SECS: &str = "TRACKER_HTTP_TIMEOUT_SECS";
pub const ENV_POLL_MAX_ATTEMPTS: &str = "TRACKER_POLL_MAX_ATTEMPTS";
pub const ENV_POLL_INTERVAL_MS: &str = "TRACKER_POLL_INTERVAL_MS";

/// Job polling budget
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Maximum number of status fetches before giving up
    pub max_attempts: u32,
    /// Delay between status fetches; zero polls back to back
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            interval_ms: 0,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server origin plus API prefix, e.g. "https://play.example.org/api"
    pub base_uri: String,
    pub timeout_secs: u64,
    pub poll: PollConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll: PollConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            ..Self::default()
        }
    }

    /// Load configuration from `TRACKER_*` environment variables, falling back
    /// to defaults for anything unset
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_uri) = lookup(ENV_BASE_URI) {
            config.base_uri = base_uri;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = parse_var(ENV_TIMEOUT_SECS, &timeout)?;
        }
        if let Some(attempts) = lookup(ENV_POLL_MAX_ATTEMPTS) {
            config.poll.max_attempts = parse_var(ENV_POLL_MAX_ATTEMPTS, &attempts)?;
        }
        if let Some(interval) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll.interval_ms = parse_var(ENV_POLL_INTERVAL_MS, &interval)?;
        }

        config.validate()?;
        debug!(
            "Loaded client config: base_uri={}, timeout={}s, poll={:?}",
            config.base_uri, config.timeout_secs, config.poll
        );
        Ok(config)
    }

    /// Partial seconds round up so a short timeout never becomes zero
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let partial = u64::from(timeout.subsec_nanos() > 0);
        self.timeout_secs = timeout.as_secs().saturating_add(partial);
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the base URI is an absolute http(s) URL and the timeout
    /// is not zero
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("{} must be at least 1 second", ENV_TIMEOUT_SECS));
        }

        let url = url::Url::parse(&self.base_uri)
            .with_context(|| format!("Invalid base URI '{}'", self.base_uri))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(anyhow!(
                "Unsupported scheme '{}' in base URI '{}'",
                other,
                self.base_uri
            )),
        }
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid value '{}' for {}", raw, name))
}
