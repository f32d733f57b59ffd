use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;
use crate::MAX_TXN_SIZE;

/// Long-poll and write batching parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// How long the store may hold a blocking watch open
    /// Default: 20 seconds
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_in_secs: u64,

    /// Operations per transaction call. The store rejects more than 64.
    /// Default: 64
    #[serde(default = "default_max_txn_size")]
    pub max_txn_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            wait_timeout_in_secs: default_wait_timeout(),
            max_txn_size: default_max_txn_size(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.wait_timeout_in_secs == 0 {
            return Err(Error::Config(ConfigError::Message(
                "watch wait timeout must be > 0".into(),
            )));
        }

        // Consul caps blocking queries at 10 minutes
        if self.wait_timeout_in_secs > 600 {
            return Err(Error::Config(ConfigError::Message(format!(
                "watch wait timeout {}s exceeds the 600s store limit",
                self.wait_timeout_in_secs
            ))));
        }

        if self.max_txn_size == 0 || self.max_txn_size > MAX_TXN_SIZE {
            return Err(Error::Config(ConfigError::Message(format!(
                "max_txn_size {} must be within 1..={}",
                self.max_txn_size, MAX_TXN_SIZE
            ))));
        }

        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_in_secs)
    }
}

fn default_wait_timeout() -> u64 {
    20
}
fn default_max_txn_size() -> usize {
    MAX_TXN_SIZE
}
