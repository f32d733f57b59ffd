//! Configuration management module for the fleet synchronization service.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Environment variable overrides
//! - Configuration file support
//! - Component-wise validation
mod keys;
mod monitoring;
mod retry;
mod store;
mod watch;
pub use keys::*;
pub use monitoring::*;
pub use retry::*;
pub use store::*;
pub use watch::*;


use std::env;
use std::fmt::Debug;
use std::path::PathBuf;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable prefix, e.g. `FLEET_SYNC__STORE__TOKEN`
pub const ENV_PREFIX: &str = "FLEET_SYNC";

/// Main configuration container
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Store endpoint and credentials
    #[serde(default)]
    pub store: StoreConfig,
    /// Key layout inside the store
    #[serde(default)]
    pub keys: KeysConfig,
    /// Long-poll and transaction sizing
    #[serde(default)]
    pub watch: WatchConfig,
    /// Backoff policies
    #[serde(default)]
    pub retry: RetryPolicies,
    /// Metrics endpoint
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Directory of the daemon log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            keys: KeysConfig::default(),
            watch: WatchConfig::default(),
            retry: RetryPolicies::default(),
            monitoring: MonitoringConfig::default(),
            log_dir: default_log_dir(),
        }
    }
}

impl Debug for SyncConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        // token stays out of logs
        f.debug_struct("SyncConfig")
            .field("store.url", &self.store.url)
            .field("keys", &self.keys)
            .field("watch", &self.watch)
            .finish()
    }
}

impl SyncConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `FLEET_SYNC__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so that `with_override_config()` can still be applied.
    /// Callers MUST call `validate()` before using the configuration.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/fleet-sync.toml");
    /// std::env::set_var("FLEET_SYNC__STORE__TOKEN", "secret");
    /// let cfg = SyncConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    ///
    /// # Errors
    /// Returns validation errors from any subsystem:
    /// - Malformed store URL
    /// - Key paths without a leading `/`
    /// - Transaction size outside `1..=64`
    /// - Zero retry delays
    pub fn validate(self) -> Result<Self> {
        self.store.validate()?;
        self.keys.validate()?;
        self.watch.validate()?;
        self.retry.validate()?;
        self.monitoring.validate()?;
        Ok(self)
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}
