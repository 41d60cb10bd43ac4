#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::rest::RestStorage;
use crate::core::lock::{self, LockPolicy};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Settings for one remote store.
///
/// `endpoint` and `token` are required; everything else has a default.
/// Operation names are appended to `endpoint` verbatim, so it normally ends
/// with `/`.
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub token: String,
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub lock: LockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_initial_backoff_ms() -> u64 {
    lock::DEFAULT_INITIAL_BACKOFF.as_millis() as u64
}

fn default_max_backoff_ms() -> u64 {
    lock::DEFAULT_MAX_BACKOFF.as_millis() as u64
}

fn default_multiplier() -> f64 {
    lock::DEFAULT_MULTIPLIER
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl LockConfig {
    pub fn policy(&self) -> LockPolicy {
        LockPolicy {
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.multiplier,
        }
    }
}

impl From<LockPolicy> for LockConfig {
    fn from(policy: LockPolicy) -> Self {
        Self {
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
            multiplier: policy.multiplier,
        }
    }
}

impl StorageConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            request_timeout_seconds: None,
            user_agent: None,
            lock: LockConfig::default(),
        }
    }

    pub fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock = policy.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_seconds = Some(timeout.as_secs().max(1));
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_required("endpoint", &self.endpoint)?;
        validation::validate_required("token", &self.token)?;

        if let Some(timeout) = self.request_timeout_seconds {
            validation::validate_range("request_timeout_seconds", timeout, 1, 3600)?;
        }
        if let Some(user_agent) = &self.user_agent {
            validation::validate_non_empty_string("user_agent", user_agent)?;
        }

        validation::validate_range("lock.multiplier", self.lock.multiplier, 1.0, 10.0)?;
        validation::validate_range(
            "lock.max_backoff_ms",
            self.lock.max_backoff_ms,
            self.lock.initial_backoff_ms,
            600_000,
        )?;

        Ok(())
    }

    /// Validates the settings and builds the adapter with a reqwest transport.
    pub fn build(&self) -> Result<RestStorage> {
        RestStorage::new(self.clone())
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("user_agent", &self.user_agent)
            .field("lock", &self.lock)
            .finish()
    }
}
