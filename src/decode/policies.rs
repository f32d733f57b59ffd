use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::warn;

use crate::metrics::DECODE_FAILURES_METRIC;
use crate::KvEntry;

const BEST_EFFORT: &str = "best_effort";
const ALL_OR_PARTIAL: &str = "all_or_partial";

/// A listing entry that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub key: String,
    pub reason: String,
}

impl fmt::Display for DecodeFailure {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

/// Some entries failed to decode; `decoded` holds all the others
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialDecode<T> {
    pub decoded: T,
    pub failures: Vec<DecodeFailure>,
}

impl<T> PartialDecode<T> {
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.key.as_str()).collect()
    }

    /// Accepts the partial result
    pub fn into_decoded(self) -> T {
        self.decoded
    }
}

impl<T> fmt::Display for PartialDecode<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "Failed to decode {} entries: {}",
            self.failures.len(),
            self.failed_keys().join(", ")
        )
    }
}

impl<T: fmt::Debug> std::error::Error for PartialDecode<T> {}

fn decode_entry<T: DeserializeOwned>(entry: &KvEntry) -> Result<Option<T>, String> {
    let text = entry.decoded_value().map_err(|e| e.to_string())?;
    match text {
        None => Ok(None),
        Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| e.to_string()),
    }
}

/// Decodes each entry independently. Entries without a value are skipped,
/// undecodable ones are dropped with a warning.
pub fn decode_best_effort<T: DeserializeOwned>(entries: &[KvEntry]) -> Vec<T> {
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        match decode_entry::<T>(entry) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => debug!("[decode_best_effort] key={} holds no value, skipped", entry.key),
            Err(reason) => {
                DECODE_FAILURES_METRIC.with_label_values(&[BEST_EFFORT]).inc();
                warn!(
                    "[decode_best_effort] dropping undecodable entry key={}: {}",
                    entry.key, reason
                );
            }
        }
    }
    records
}

/// Decodes every entry whose key yields an id through `id_of`.
///
/// Keys without an id are skipped and are not failures. An entry without
/// a value is a failure. Decoding continues past failures; if there were
/// any, the decoded records come back inside the error.
pub fn decode_all_or_partial<T, F>(
    entries: &[KvEntry],
    id_of: F,
) -> Result<HashMap<String, T>, PartialDecode<HashMap<String, T>>>
where
    T: DeserializeOwned,
    F: Fn(&str) -> Option<String>,
{
    let mut decoded = HashMap::with_capacity(entries.len());
    let mut failures = Vec::new();

    for entry in entries {
        let Some(id) = id_of(&entry.key) else {
            debug!("[decode_all_or_partial] skip unknown key={}", entry.key);
            continue;
        };

        match decode_entry::<T>(entry) {
            Ok(Some(record)) => {
                decoded.insert(id, record);
            }
            Ok(None) => failures.push(DecodeFailure {
                key: entry.key.clone(),
                reason: "no value".to_string(),
            }),
            Err(reason) => {
                warn!(
                    "[decode_all_or_partial] failed to decode record {} (key={}): {}",
                    id, entry.key, reason
                );
                failures.push(DecodeFailure {
                    key: entry.key.clone(),
                    reason,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(decoded)
    } else {
        DECODE_FAILURES_METRIC
            .with_label_values(&[ALL_OR_PARTIAL])
            .inc_by(failures.len() as u64);
        Err(PartialDecode { decoded, failures })
    }
}
