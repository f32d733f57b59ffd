mod mock_store_server;
pub(crate) use mock_store_server::*;

use serde_json::json;

use crate::KvEntry;
use crate::TxnOperation;

/// Listing body in the store's wire format: `[{"Key":..,"Value":<base64>}]`
pub(crate) fn listing_body(entries: &[(&str, Option<&str>)]) -> String {
    let items: Vec<_> = entries
        .iter()
        .map(|(key, value)| {
            let entry = KvEntry::new(*key, *value);
            json!({
                "Key": entry.key,
                "Value": entry.value,
                "CreateIndex": 1,
                "ModifyIndex": 1,
                "Flags": 0,
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Engine report with a single deployed chain `chain-1`
pub(crate) fn engine_state_json(engine: &str) -> String {
    json!({
        "engine": {
            "domain": "default",
            "engineDeploymentName": engine,
            "host": "10.0.0.1",
        },
        "deployments": {
            "d-1": {
                "deploymentInfo": {
                    "deploymentId": "d-1",
                    "chainId": "chain-1",
                    "chainName": "Orders",
                    "snapshotId": "s-1",
                    "createdWhen": 1700000000000i64,
                },
                "state": {"status": "DEPLOYED", "suspended": false},
            }
        }
    })
    .to_string()
}

/// Runtime properties JSON with the given log level
pub(crate) fn runtime_properties_json(log_level: &str) -> String {
    json!({
        "sessionsLoggingLevel": "INFO",
        "logLoggingLevel": log_level,
        "logPayload": ["BODY"],
        "maskingEnabled": true,
    })
    .to_string()
}

/// `count` distinct set operations, keyed `k/0000`, `k/0001`, ...
pub(crate) fn set_ops(count: usize) -> Vec<TxnOperation> {
    (0..count)
        .map(|i| TxnOperation::set(format!("k/{i:04}"), format!("v{i}")))
        .collect()
}
