//! Lock configuration
//!
//! Process-wide defaults shared by every session of a `LockManager`. Values
//! come from `LockConfig::default()`, an optional config file, and
//! `HOLDFAST_`-prefixed environment variables, in that order of precedence
//! (later wins).

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment};
use holdfast_common::{DEFAULT_KEY_PREFIX, LockError};
use serde::{Deserialize, Serialize};

/// Environment variable prefix (e.g. `HOLDFAST_POLL_INTERVAL_MS`)
pub const ENV_PREFIX: &str = "HOLDFAST";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_TTL_MS: u64 = 60_000;
pub const DEFAULT_EXTEND_INTERVAL_MS: u64 = 15_000;
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

/// Defaults applied to every lock session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Delay between acquisition attempts
    pub poll_interval_ms: u64,
    /// Lease duration
    pub ttl_ms: u64,
    /// Period between lease renewals
    pub extend_interval_ms: u64,
    /// How long `synchronize` retries acquisition before giving up
    pub acquire_timeout_ms: u64,
    /// Namespace prepended to lock names in the store
    pub key_prefix: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            ttl_ms: DEFAULT_TTL_MS,
            extend_interval_ms: DEFAULT_EXTEND_INTERVAL_MS,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl LockConfig {
    /// Load from `HOLDFAST_*` environment variables over the defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Self::load(None::<&Path>)
    }

    /// Load from an optional config file, then environment variables
    ///
    /// The file format is inferred from its extension (toml, yaml, json, ...).
    pub fn load(file: Option<impl AsRef<Path>>) -> anyhow::Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path.as_ref()).required(true));
        }

        let config: LockConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check that the defaults describe a usable lease
    pub fn validate(&self) -> Result<(), LockError> {
        if self.poll_interval_ms == 0 {
            return Err(LockError::invalid("poll_interval_ms must be greater than 0"));
        }
        crate::options::validate_timings(
            i64::try_from(self.ttl_ms).unwrap_or(i64::MAX),
            i64::try_from(self.extend_interval_ms).unwrap_or(i64::MAX),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn extend_interval(&self) -> Duration {
        Duration::from_millis(self.extend_interval_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}
