//! Per-call session options for `synchronize`

use std::time::Duration;

use holdfast_common::LockError;

use crate::config::LockConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Wait {
    #[default]
    Default,
    Bounded(i64),
    Forever,
}

/// Options for a single `synchronize` call
///
/// Timings are signed milliseconds so that nonsense values are rejected at the
/// call site rather than silently clamped. Unset values take the manager's
/// `LockConfig` defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    ttl_ms: Option<i64>,
    extend_interval_ms: Option<i64>,
    acquire_timeout: Wait,
    condition: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            ttl_ms: None,
            extend_interval_ms: None,
            acquire_timeout: Wait::Default,
            condition: true,
        }
    }
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lease duration
    pub fn ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = Some(ttl_ms);
        self
    }

    /// Period between lease renewals
    pub fn extend_interval_ms(mut self, extend_interval_ms: i64) -> Self {
        self.extend_interval_ms = Some(extend_interval_ms);
        self
    }

    /// Maximum time to keep retrying acquisition; `0` makes a single attempt
    pub fn acquire_timeout_ms(mut self, acquire_timeout_ms: i64) -> Self {
        self.acquire_timeout = Wait::Bounded(acquire_timeout_ms);
        self
    }

    /// Retry acquisition until it succeeds
    pub fn wait_forever(mut self) -> Self {
        self.acquire_timeout = Wait::Forever;
        self
    }

    /// Only lock when `condition` holds; otherwise the operation runs unlocked
    pub fn when(mut self, condition: bool) -> Self {
        self.condition = condition;
        self
    }

    pub fn condition(&self) -> bool {
        self.condition
    }

    /// Fill in defaults from `config` and validate the result
    pub(crate) fn resolve(&self, config: &LockConfig) -> Result<SessionParams, LockError> {
        let ttl_ms = self
            .ttl_ms
            .unwrap_or_else(|| i64::try_from(config.ttl_ms).unwrap_or(i64::MAX));
        let extend_interval_ms = self
            .extend_interval_ms
            .unwrap_or_else(|| i64::try_from(config.extend_interval_ms).unwrap_or(i64::MAX));

        validate_timings(ttl_ms, extend_interval_ms)?;

        let acquire_timeout = match self.acquire_timeout {
            Wait::Default => Some(config.acquire_timeout()),
            Wait::Bounded(ms) if ms < 0 => {
                return Err(LockError::invalid(format!(
                    "acquire_timeout must not be negative, got {}ms",
                    ms
                )));
            }
            Wait::Bounded(ms) => Some(Duration::from_millis(ms as u64)),
            Wait::Forever => None,
        };

        Ok(SessionParams {
            ttl: Duration::from_millis(ttl_ms as u64),
            extend_interval: Duration::from_millis(extend_interval_ms as u64),
            acquire_timeout,
        })
    }
}

/// Validated timings of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SessionParams {
    pub ttl: Duration,
    pub extend_interval: Duration,
    /// `None` retries until acquired
    pub acquire_timeout: Option<Duration>,
}

/// Require `ttl > extend_interval >= 0`
pub fn validate_timings(ttl_ms: i64, extend_interval_ms: i64) -> Result<(), LockError> {
    if extend_interval_ms < 0 {
        return Err(LockError::invalid(format!(
            "extend_interval must not be negative, got {}ms",
            extend_interval_ms
        )));
    }
    if ttl_ms <= extend_interval_ms {
        return Err(LockError::invalid(format!(
            "ttl ({}ms) must be greater than extend_interval ({}ms)",
            ttl_ms, extend_interval_ms
        )));
    }
    Ok(())
}
