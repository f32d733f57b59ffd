//! KV transport layer over the coordination store's HTTP API.
//!
//! The transport is stateless: it knows keys, listings, indices and
//! transactions, nothing about engines or chains. All calls carry the
//! authentication token. A blocking watch is a single request that the store
//! holds open until something under the key changes or the wait time elapses.
mod http_kv_store;
mod types;

pub use http_kv_store::*;
pub use types::*;


use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Reads a key, or every key under a prefix when `recurse` is set.
    ///
    /// # Errors
    /// - [`crate::Error::NotFound`] if the key (or prefix) does not exist
    /// - [`crate::Error::Transport`] for any other non-success outcome
    async fn get(
        &self,
        key: &str,
        recurse: bool,
    ) -> Result<Vec<KvEntry>>;

    /// Creates or replaces a single key.
    ///
    /// Success requires the store's acknowledgement marker in the body, a 200
    /// status alone is not enough.
    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
    ) -> Result<()>;

    /// Removes a key, or a whole subtree when `recurse` is set.
    async fn delete(
        &self,
        key: &str,
        recurse: bool,
    ) -> Result<()>;

    /// Blocking listing.
    ///
    /// Returns immediately when `since` is behind the store's index; otherwise
    /// the store holds the request until a change or until `wait` elapses,
    /// and then answers with its current index and listing (possibly
    /// unchanged). An absent prefix is [`crate::Error::NotFound`], exactly as
    /// for [`KvStore::get`].
    async fn watch(
        &self,
        key: &str,
        recurse: bool,
        since: StoreIndex,
        wait: Duration,
    ) -> Result<WatchResponse>;

    /// Submits a single transaction of at most [`crate::MAX_TXN_SIZE`] operations.
    ///
    /// # Errors
    /// - [`crate::Error::Conflict`] when the store detected a concurrent modification
    /// - [`crate::Error::Transport`] for any other failure, including a body
    ///   reporting per-operation errors
    async fn transaction(
        &self,
        ops: Vec<TxnOperation>,
    ) -> Result<TxnResponse>;
}

/// Renders a wait duration the way the store expects it, e.g. `20s`
pub fn format_wait(wait: Duration) -> String {
    if wait.subsec_millis() == 0 {
        format!("{}s", wait.as_secs())
    } else {
        format!("{}ms", wait.as_millis())
    }
}
