//! Synchronization Error Hierarchy
//!
//! Defines the error taxonomy for the KV transport, the batched writer, the
//! index tracker and the record decoders, categorized by how a caller is
//! expected to recover.

use config::ConfigError;
use tokio::task::JoinError;

use crate::decode::PartialDecode;
use crate::txn::BatchedTxnError;
use crate::ChainRuntimeProperties;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key (or key prefix, when listing recursively) is absent in the store.
    /// Usually a cold-start condition rather than a fault.
    #[error("Key not found in store: {key}")]
    NotFound { key: String },

    /// Any non-success store outcome other than "not found" or "conflict"
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The store rejected a transaction because of a concurrent modification.
    /// Safe to retry.
    #[error("Transaction conflict: {message}")]
    Conflict { message: String },

    /// One or more chain runtime property entries could not be decoded.
    /// Carries every record that did decode.
    #[error(transparent)]
    PartialDecode(Box<PartialDecode<ChainRuntimeProperties>>),

    /// A chunked transaction stopped part way through
    #[error(transparent)]
    PartialWrite(Box<BatchedTxnError>),

    /// Index history misuse
    #[error(transparent)]
    Rollback(#[from] RollbackError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local file system failures, e.g. the daemon log directory
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding of values written to or read from the store
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// A key exists but holds a value of the wrong shape
    #[error("Invalid value under key {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("{0}")]
    SignalSenderClosed(String),

    #[error("Retry timeout")]
    RetryTimeoutError,

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Error {
    /// Conflicts are the only failures a caller may blindly retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, timeout or body read failures reported by the HTTP client
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Store answered with a status we do not handle
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Write was answered with a 2xx status but without the success marker
    #[error("Store did not acknowledge write, response: {body}")]
    NotAcknowledged { body: String },

    /// Transaction response body reported per-operation errors
    #[error("Store reported transaction errors: {errors:?}")]
    StoreErrors { errors: Vec<String> },

    /// Listing response without the index header
    #[error("Response is missing the {0} header")]
    MissingIndexHeader(&'static str),

    #[error("Invalid index header value: {0}")]
    InvalidIndexHeader(String),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RollbackError {
    /// Only one step of index history is kept
    #[error("No index history to roll back for resource {resource}")]
    NoHistory { resource: String },
}

/// Failure to turn a listing entry's raw value into text
#[derive(Debug, thiserror::Error)]
pub enum ValueDecodeError {
    #[error("Value is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Value is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// ============== Conversion Implementations ============== //
impl From<PartialDecode<ChainRuntimeProperties>> for Error {
    fn from(e: PartialDecode<ChainRuntimeProperties>) -> Self {
        Error::PartialDecode(Box::new(e))
    }
}

impl From<BatchedTxnError> for Error {
    fn from(e: BatchedTxnError) -> Self {
        Error::PartialWrite(Box::new(e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e).into()
    }
}
