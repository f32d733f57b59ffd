use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Connection settings for the coordination store
#[derive(Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the store HTTP API, e.g. `http://consul:8500`
    /// Default: "http://127.0.0.1:8500"
    #[serde(default = "default_url")]
    pub url: String,

    /// ACL token sent with every request
    /// Default: "" (anonymous)
    #[serde(default)]
    pub token: String,

    /// Maximum time to wait for establishing a TCP connection
    /// Default: 1000ms
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_in_ms: u64,

    /// Upper bound for non-blocking requests. Blocking watches add a margin
    /// on top of their own wait time instead.
    /// Default: 5000ms
    #[serde(default = "default_request_timeout")]
    pub request_timeout_in_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: String::new(),
            connect_timeout_in_ms: default_connect_timeout(),
            request_timeout_in_ms: default_request_timeout(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(ConfigError::Message(format!(
                "store url {} must start with http:// or https://",
                self.url
            ))));
        }

        if self.connect_timeout_in_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "store connect timeout must be > 0".into(),
            )));
        }

        if self.request_timeout_in_ms <= self.connect_timeout_in_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "store request timeout {}ms must exceed connect timeout {}ms",
                self.request_timeout_in_ms, self.connect_timeout_in_ms
            ))));
        }

        Ok(())
    }

    /// URL with trailing slashes removed
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_in_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_in_ms)
    }
}

fn default_url() -> String {
    "http://127.0.0.1:8500".into()
}
fn default_connect_timeout() -> u64 {
    1000
}
fn default_request_timeout() -> u64 {
    5000
}
