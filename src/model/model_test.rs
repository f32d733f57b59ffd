use std::collections::BTreeSet;

use serde_json::json;

use crate::test_utils::engine_state_json;
use crate::DeploymentRuntimeProperties;
use crate::DeploymentStatus;
use crate::EngineState;
use crate::LibraryUpdate;
use crate::LogLoggingLevel;
use crate::LogPayload;
use crate::SessionsLoggingLevel;

#[test]
fn test_engine_state_from_report() {
    let state: EngineState = serde_json::from_str(&engine_state_json("engine-1")).unwrap();

    assert_eq!(state.engine.engine_deployment_name, "engine-1");
    assert_eq!(state.deployments.len(), 1);

    let deployment = &state.deployments["d-1"];
    assert_eq!(deployment.deployment_info.chain_id.as_deref(), Some("chain-1"));
    assert_eq!(deployment.state.status, DeploymentStatus::Deployed);
    assert!(!deployment.state.suspended);
    assert_eq!(state.deployments_of_chain("chain-1").count(), 1);
    assert!(!state.has_failed_deployments());
}

#[test]
fn test_engine_state_without_deployments() {
    let state: EngineState = serde_json::from_value(json!({
        "engine": {"domain": "default", "engineDeploymentName": "e", "host": "10.0.0.1"}
    }))
    .unwrap();

    assert!(state.deployments.is_empty());
}

#[test]
fn test_failed_deployment_is_reported() {
    let state: EngineState = serde_json::from_value(json!({
        "engine": {"domain": "default", "engineDeploymentName": "e", "host": "h"},
        "deployments": {
            "d-9": {
                "deploymentInfo": {"deploymentId": "d-9", "chainId": "c"},
                "state": {"status": "FAILED", "error": "boom", "stacktrace": "at x"}
            }
        }
    }))
    .unwrap();

    assert!(state.has_failed_deployments());
    assert_eq!(state.deployments["d-9"].state.error.as_deref(), Some("boom"));
}

#[test]
fn test_engine_state_rejects_unknown_status() {
    let result = serde_json::from_value::<EngineState>(json!({
        "engine": {"domain": "default", "engineDeploymentName": "e", "host": "h"},
        "deployments": {
            "d": {"deploymentInfo": {"deploymentId": "d"}, "state": {"status": "EXPLODED"}}
        }
    }));

    assert!(result.is_err());
}

#[test]
fn test_runtime_properties_default_values() {
    let defaults = DeploymentRuntimeProperties::default_values();

    assert_eq!(defaults.sessions_logging_level, Some(SessionsLoggingLevel::Off));
    assert_eq!(defaults.effective_log_level(), LogLoggingLevel::Error);
    assert_eq!(
        defaults.log_payload,
        Some(BTreeSet::from([LogPayload::Headers, LogPayload::Properties]))
    );
    assert!(defaults.masking_enabled);
    assert!(!defaults.dpt_events_enabled);
    assert!(!defaults.log_payload_enabled);
}

#[test]
fn test_effective_log_level_falls_back() {
    let props: DeploymentRuntimeProperties = serde_json::from_str("{}").unwrap();
    assert_eq!(props.log_logging_level, None);
    assert_eq!(props.effective_log_level(), LogLoggingLevel::Error);

    let props: DeploymentRuntimeProperties = serde_json::from_str(r#"{"logLoggingLevel":"INFO"}"#).unwrap();
    assert_eq!(props.effective_log_level(), LogLoggingLevel::Info);
}

#[test]
fn test_runtime_properties_wire_names() {
    let value = serde_json::to_value(DeploymentRuntimeProperties::default_values()).unwrap();

    assert_eq!(value["sessionsLoggingLevel"], "OFF");
    assert_eq!(value["logLoggingLevel"], "ERROR");
    assert_eq!(value["logPayload"], json!(["HEADERS", "PROPERTIES"]));
    assert_eq!(value["maskingEnabled"], true);
    assert_eq!(value["dptEventsEnabled"], false);
}

#[test]
fn test_library_update_wire_names() {
    let value = serde_json::to_value(LibraryUpdate {
        system_id: "s".into(),
        specification_id: "spec".into(),
    })
    .unwrap();

    assert_eq!(value, json!({"systemId": "s", "specificationId": "spec"}));
}
