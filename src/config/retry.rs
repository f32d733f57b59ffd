use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Basic retry policy template
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Maximum number of retries (0 means no retry)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Single operation timeout (unit: milliseconds)
    #[serde(default = "default_op_timeout_ms")]
    pub timeout_ms: u64,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl BackoffPolicy {
    /// Exponential delay before attempt number `attempt` (1-based), capped
    /// at `max_delay_ms`
    pub fn delay_for(
        &self,
        attempt: u32,
    ) -> Duration {
        let shift = attempt.saturating_sub(1).min(20);
        let delay = self.base_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(
        &self,
        name: &str,
    ) -> Result<()> {
        if self.base_delay_ms == 0 {
            return Err(Error::Config(ConfigError::Message(format!(
                "retry.{name}.base_delay_ms must be > 0"
            ))));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "retry.{name}.max_delay_ms {} must be >= base_delay_ms {}",
                self.max_delay_ms, self.base_delay_ms
            ))));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(format!(
                "retry.{name}.timeout_ms must be > 0"
            ))));
        }
        Ok(())
    }
}

/// Divide strategies by concern
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryPolicies {
    /// Delay between failed poll loop iterations. `max_retries` is unused:
    /// poll loops never give up.
    #[serde(default = "default_poll_policy")]
    pub poll: BackoffPolicy,

    /// Per-chunk retry when a transaction hits a conflict
    #[serde(default = "default_txn_conflict_policy")]
    pub txn_conflict: BackoffPolicy,
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            poll: default_poll_policy(),
            txn_conflict: default_txn_conflict_policy(),
        }
    }
}

impl RetryPolicies {
    pub fn validate(&self) -> Result<()> {
        self.poll.validate("poll")?;
        self.txn_conflict.validate("txn_conflict")?;
        Ok(())
    }
}

fn default_poll_policy() -> BackoffPolicy {
    BackoffPolicy {
        max_retries: 0,
        timeout_ms: 30_000,
        base_delay_ms: 500,
        max_delay_ms: 30_000,
    }
}
fn default_txn_conflict_policy() -> BackoffPolicy {
    BackoffPolicy {
        max_retries: 0,
        timeout_ms: default_op_timeout_ms(),
        base_delay_ms: default_base_delay_ms(),
        max_delay_ms: default_max_delay_ms(),
    }
}
fn default_max_retries() -> usize {
    3
}
fn default_op_timeout_ms() -> u64 {
    5000
}
fn default_base_delay_ms() -> u64 {
    50
}
fn default_max_delay_ms() -> u64 {
    1000
}
