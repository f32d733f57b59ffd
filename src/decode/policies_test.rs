use tracing_test::traced_test;

use crate::decode_all_or_partial;
use crate::decode_best_effort;
use crate::extract_record_id;
use crate::test_utils::engine_state_json;
use crate::test_utils::runtime_properties_json;
use crate::DeploymentRuntimeProperties;
use crate::EngineState;
use crate::KvEntry;
use crate::LogLoggingLevel;

const CHAINS: &str = "config/local/qip-engine-configurations/runtime-configurations/chains";
const MARKER: &str = "runtime-configurations";

fn chain_id(key: &str) -> Option<String> {
    extract_record_id(key, MARKER)
}

fn chain_entry(
    id: &str,
    value: Option<&str>,
) -> KvEntry {
    KvEntry::new(format!("{CHAINS}/{id}"), value)
}

#[test]
#[traced_test]
fn test_best_effort_drops_malformed_entry() {
    let first = engine_state_json("engine-1");
    let third = engine_state_json("engine-3");
    let entries = vec![
        KvEntry::new("engines-state/engine-1", Some(&first)),
        KvEntry::new("engines-state/engine-2", Some("{not json")),
        KvEntry::new("engines-state/engine-3", Some(&third)),
    ];

    let records: Vec<EngineState> = decode_best_effort(&entries);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].engine.engine_deployment_name, "engine-1");
    assert_eq!(records[1].engine.engine_deployment_name, "engine-3");
    assert!(logs_contain("dropping undecodable entry key=engines-state/engine-2"));
}

#[test]
#[traced_test]
fn test_best_effort_skips_empty_and_garbage_values() {
    let good = engine_state_json("engine-1");
    let mut not_base64 = KvEntry::new("engines-state/engine-2", None);
    not_base64.value = Some("%%%".to_string());
    let entries = vec![
        KvEntry::new("engines-state/engine-1", Some(&good)),
        not_base64,
        KvEntry::new("engines-state/engine-3", None),
    ];

    let records: Vec<EngineState> = decode_best_effort(&entries);

    assert_eq!(records.len(), 1);
    assert!(logs_contain("engine-2"));
}

#[test]
fn test_best_effort_on_empty_listing() {
    let records: Vec<EngineState> = decode_best_effort(&[]);
    assert!(records.is_empty());
}

#[test]
#[traced_test]
fn test_all_or_partial_carries_valid_records() {
    let info = runtime_properties_json("INFO");
    let warn = runtime_properties_json("WARN");
    let entries = vec![
        chain_entry("a", Some(&info)),
        chain_entry("b", Some(r#"{"logLoggingLevel": 42}"#)),
        chain_entry("c", Some(&warn)),
    ];

    let err = decode_all_or_partial::<DeploymentRuntimeProperties, _>(&entries, chain_id).unwrap_err();

    assert_eq!(err.decoded.len(), 2);
    assert_eq!(err.decoded["a"].effective_log_level(), LogLoggingLevel::Info);
    assert_eq!(err.decoded["c"].effective_log_level(), LogLoggingLevel::Warn);
    assert_eq!(err.failed_keys(), vec![format!("{CHAINS}/b").as_str()]);
    assert!(err.to_string().contains("Failed to decode 1 entries"));
    assert!(logs_contain("failed to decode record b"));
}

#[test]
fn test_all_or_partial_succeeds_when_all_decode() {
    let info = runtime_properties_json("INFO");
    let entries = vec![chain_entry("a", Some(&info)), chain_entry("b", Some("{}"))];

    let decoded = decode_all_or_partial::<DeploymentRuntimeProperties, _>(&entries, chain_id).unwrap();

    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded["b"], DeploymentRuntimeProperties::default());
}

#[test]
fn test_all_or_partial_treats_missing_value_as_failure() {
    let entries = vec![chain_entry("a", None)];

    let err = decode_all_or_partial::<DeploymentRuntimeProperties, _>(&entries, chain_id).unwrap_err();

    assert!(err.decoded.is_empty());
    assert_eq!(err.failures[0].reason, "no value");
}

#[test]
fn test_all_or_partial_skips_keys_without_id() {
    let info = runtime_properties_json("INFO");
    let entries = vec![
        // folder key of the listing itself
        KvEntry::new(format!("{CHAINS}/"), None),
        KvEntry::new("unrelated/key", Some("garbage")),
        chain_entry("a", Some(&info)),
    ];

    let decoded = decode_all_or_partial::<DeploymentRuntimeProperties, _>(&entries, chain_id).unwrap();

    assert_eq!(decoded.len(), 1);
    assert!(decoded.contains_key("a"));
}

#[test]
fn test_partial_result_can_be_accepted() {
    let entries = vec![chain_entry("a", Some("{}")), chain_entry("b", Some("["))];

    let err = decode_all_or_partial::<DeploymentRuntimeProperties, _>(&entries, chain_id).unwrap_err();
    let accepted = err.into_decoded();

    assert_eq!(accepted.len(), 1);
}
