use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Key layout inside the store
///
/// Every segment starts with `/` and is concatenated as-is, so the full
/// engines state prefix is `prefix + engine_config_root + engines_state`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KeysConfig {
    /// Namespace shared by every key this service touches
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_engine_config_root")]
    pub engine_config_root: String,

    /// Single key holding the last deployment modification timestamp
    #[serde(default = "default_deployments_update")]
    pub deployments_update: String,

    /// Prefix under which every engine reports its own state
    #[serde(default = "default_engines_state")]
    pub engines_state: String,

    #[serde(default = "default_libraries_update")]
    pub libraries_update: String,

    /// Marker segment; chain ids sit two segments after it
    #[serde(default = "default_runtime_configurations")]
    pub runtime_configurations: String,

    #[serde(default = "default_chains")]
    pub chains: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            engine_config_root: default_engine_config_root(),
            deployments_update: default_deployments_update(),
            engines_state: default_engines_state(),
            libraries_update: default_libraries_update(),
            runtime_configurations: default_runtime_configurations(),
            chains: default_chains(),
        }
    }
}

impl KeysConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("prefix", &self.prefix),
            ("engine_config_root", &self.engine_config_root),
            ("deployments_update", &self.deployments_update),
            ("engines_state", &self.engines_state),
            ("libraries_update", &self.libraries_update),
            ("runtime_configurations", &self.runtime_configurations),
            ("chains", &self.chains),
        ] {
            if !value.starts_with('/') || value.len() < 2 {
                return Err(Error::Config(ConfigError::Message(format!(
                    "keys.{name} = {value:?} must be a non-empty path starting with '/'"
                ))));
            }
            if value.ends_with('/') {
                return Err(Error::Config(ConfigError::Message(format!(
                    "keys.{name} = {value:?} must not end with '/'"
                ))));
            }
        }
        Ok(())
    }

    fn engine_root(&self) -> String {
        format!("{}{}", self.prefix, self.engine_config_root)
    }

    pub fn deployments_update_key(&self) -> String {
        format!("{}{}", self.engine_root(), self.deployments_update)
    }

    pub fn engines_state_key(&self) -> String {
        format!("{}{}", self.engine_root(), self.engines_state)
    }

    pub fn libraries_update_key(&self) -> String {
        format!("{}{}", self.engine_root(), self.libraries_update)
    }

    pub fn chains_runtime_key(&self) -> String {
        format!(
            "{}{}{}",
            self.engine_root(),
            self.runtime_configurations,
            self.chains
        )
    }

    pub fn chain_runtime_key(
        &self,
        chain_id: &str,
    ) -> String {
        format!("{}/{}", self.chains_runtime_key(), chain_id)
    }

    pub fn legacy_chains_runtime_key(&self) -> String {
        format!(
            "{}{}",
            self.engine_root(),
            crate::CHAINS_RUNTIME_CONFIGURATIONS_LEGACY
        )
    }

    /// Segment name searched for when extracting chain ids from keys
    pub fn runtime_configurations_marker(&self) -> &str {
        self.runtime_configurations.trim_start_matches('/')
    }
}

fn default_prefix() -> String {
    "/config/local".into()
}
fn default_engine_config_root() -> String {
    "/qip-engine-configurations".into()
}
fn default_deployments_update() -> String {
    "/deployments-update".into()
}
fn default_engines_state() -> String {
    "/engines-state".into()
}
fn default_libraries_update() -> String {
    "/libraries-update".into()
}
fn default_runtime_configurations() -> String {
    "/runtime-configurations".into()
}
fn default_chains() -> String {
    "/chains".into()
}
