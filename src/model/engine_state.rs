use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// Report an engine pod publishes under the engines state prefix, one key
/// per pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub engine: EngineInfo,
    /// Keyed by deployment id
    #[serde(default)]
    pub deployments: HashMap<String, EngineDeployment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInfo {
    /// Engine domain the pod belongs to
    pub domain: String,
    pub engine_deployment_name: String,
    pub host: String,
}

/// A deployment as applied on one engine pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDeployment {
    pub deployment_info: DeploymentInfo,
    pub state: RuntimeDeploymentState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub deployment_id: String,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub chain_name: Option<String>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub snapshot_name: Option<String>,
    /// Status code in case of deployment failure
    #[serde(default)]
    pub chain_status_code: Option<String>,
    /// Epoch millis
    #[serde(default)]
    pub created_when: Option<i64>,
    #[serde(default)]
    pub contains_checkpoint_elements: Option<bool>,
    #[serde(default)]
    pub contains_scheduler_elements: Option<bool>,
    /// Sub-chains reached through chain calls
    #[serde(default)]
    pub dependency_chain_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeDeploymentState {
    pub status: DeploymentStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stacktrace: Option<String>,
    /// Deployment waits for pod initialization
    #[serde(default)]
    pub suspended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Deployed,
    Processing,
    Failed,
    Removed,
}

impl EngineState {
    /// Deployments of `chain_id` present on this pod
    pub fn deployments_of_chain<'a>(
        &'a self,
        chain_id: &'a str,
    ) -> impl Iterator<Item = &'a EngineDeployment> + 'a {
        self.deployments
            .values()
            .filter(move |d| d.deployment_info.chain_id.as_deref() == Some(chain_id))
    }

    pub fn has_failed_deployments(&self) -> bool {
        self.deployments
            .values()
            .any(|d| d.state.status == DeploymentStatus::Failed)
    }
}
