use std::collections::BTreeSet;
use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// Runtime properties of every chain, keyed by chain id
pub type ChainRuntimeProperties = HashMap<String, DeploymentRuntimeProperties>;

/// Logging and masking switches of a deployed chain.
///
/// `Default` is the empty record an engine receives when a field was never
/// set; [`DeploymentRuntimeProperties::default_values`] is what the catalog
/// writes for a new chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRuntimeProperties {
    #[serde(default)]
    pub sessions_logging_level: Option<SessionsLoggingLevel>,
    #[serde(default)]
    pub log_logging_level: Option<LogLoggingLevel>,
    #[serde(default)]
    pub log_payload: Option<BTreeSet<LogPayload>>,
    /// Superseded by `log_payload`, still read by older engines
    #[serde(default)]
    pub log_payload_enabled: bool,
    #[serde(default)]
    pub dpt_events_enabled: bool,
    #[serde(default)]
    pub masking_enabled: bool,
}

impl DeploymentRuntimeProperties {
    pub fn default_values() -> Self {
        Self {
            sessions_logging_level: Some(SessionsLoggingLevel::Off),
            log_logging_level: Some(LogLoggingLevel::Error),
            log_payload: Some(BTreeSet::from([LogPayload::Headers, LogPayload::Properties])),
            log_payload_enabled: false,
            dpt_events_enabled: false,
            masking_enabled: true,
        }
    }

    /// Log level, falling back to [`LogLoggingLevel::default`] when unset
    pub fn effective_log_level(&self) -> LogLoggingLevel {
        self.log_logging_level.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionsLoggingLevel {
    Off,
    Error,
    Info,
    Debug,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLoggingLevel {
    #[default]
    Error,
    Warn,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogPayload {
    Body,
    Headers,
    Properties,
}
