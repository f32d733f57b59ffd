use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde::Serialize;

use crate::ValueDecodeError;

/// Store-wide modification counter.
///
/// Not scoped to a key: any write anywhere in a watched range advances it.
/// Two resources watched independently each remember their own value of the
/// same global counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreIndex(pub u64);

impl StoreIndex {
    /// "No history": a watch with this index returns immediately
    pub const ZERO: StoreIndex = StoreIndex(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for StoreIndex {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StoreIndex {
    fn from(value: u64) -> Self {
        StoreIndex(value)
    }
}

/// One key of a listing as returned by get/watch.
///
/// `raw_value` keeps the store's base64 text untouched; decoding happens on
/// demand through [`KvEntry::decoded_value`] so that a single garbage entry
/// never fails the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KvEntry {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
    #[serde(default)]
    pub flags: u64,
}

impl KvEntry {
    /// Builds an entry holding `value` encoded the way the store returns it
    pub fn new(
        key: impl Into<String>,
        value: Option<&str>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.map(|v| STANDARD.encode(v.as_bytes())),
            create_index: 0,
            modify_index: 0,
            flags: 0,
        }
    }

    /// Raw bytes of the value, `None` when the key holds no value
    pub fn raw_value(&self) -> Result<Option<Vec<u8>>, ValueDecodeError> {
        match &self.value {
            None => Ok(None),
            Some(encoded) => Ok(Some(STANDARD.decode(encoded)?)),
        }
    }

    /// Value as UTF-8 text, `None` when the key holds no value
    pub fn decoded_value(&self) -> Result<Option<String>, ValueDecodeError> {
        match self.raw_value()? {
            None => Ok(None),
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
        }
    }
}

/// Result of a blocking listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchResponse {
    /// Store index reported with the listing
    pub index: StoreIndex,
    pub entries: Vec<KvEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxnVerb {
    Set,
    Get,
    Delete,
    DeleteTree,
    /// Check-and-set against `index`
    Cas,
    CheckIndex,
}

/// Single KV operation inside a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxnOperation {
    pub verb: TxnVerb,
    /// Key without a leading slash, e.g. `config/local/chains/abc`
    pub key: String,
    pub value: Option<Vec<u8>>,
    /// Required by `Cas` and `CheckIndex`
    pub index: Option<u64>,
}

impl TxnOperation {
    pub fn set(
        key: impl Into<String>,
        value: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            verb: TxnVerb::Set,
            key: key.into(),
            value: Some(value.as_ref().to_vec()),
            index: None,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            verb: TxnVerb::Delete,
            key: key.into(),
            value: None,
            index: None,
        }
    }

    pub fn delete_tree(key: impl Into<String>) -> Self {
        Self {
            verb: TxnVerb::DeleteTree,
            key: key.into(),
            value: None,
            index: None,
        }
    }

    pub fn cas(
        key: impl Into<String>,
        value: impl AsRef<[u8]>,
        index: u64,
    ) -> Self {
        Self {
            verb: TxnVerb::Cas,
            key: key.into(),
            value: Some(value.as_ref().to_vec()),
            index: Some(index),
        }
    }

    pub(crate) fn to_wire(&self) -> TxnOpWire {
        TxnOpWire {
            kv: TxnKvWire {
                verb: self.verb,
                key: self.key.clone(),
                value: self.value.as_ref().map(|v| STANDARD.encode(v)),
                index: self.index,
            },
        }
    }
}

/// `{"KV": {"Verb": ..., "Key": ..., "Value": <base64>}}`
#[derive(Debug, Serialize)]
pub(crate) struct TxnOpWire {
    #[serde(rename = "KV")]
    kv: TxnKvWire,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TxnKvWire {
    verb: TxnVerb,
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<u64>,
}

/// Per-operation result of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TxnResultEntry {
    #[serde(rename = "KV")]
    pub kv: Option<KvEntry>,
}

/// Store-reported failure of one operation of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxnOpError {
    pub op_index: usize,
    pub what: String,
}

impl fmt::Display for TxnOpError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "op #{}: {}", self.op_index, self.what)
    }
}

/// Body of a transaction response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxnResponse {
    #[serde(default)]
    pub results: Option<Vec<TxnResultEntry>>,
    #[serde(default)]
    pub errors: Option<Vec<TxnOpError>>,
}

impl TxnResponse {
    /// Appends another chunk's results
    pub fn merge(
        &mut self,
        other: TxnResponse,
    ) {
        if let Some(results) = other.results {
            self.results.get_or_insert_with(Vec::new).extend(results);
        }
        if let Some(errors) = other.errors {
            self.errors.get_or_insert_with(Vec::new).extend(errors);
        }
    }

    pub fn result_count(&self) -> usize {
        self.results.as_ref().map_or(0, Vec::len)
    }
}
