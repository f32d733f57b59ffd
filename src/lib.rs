//! Synchronization layer between a control plane and a fleet of engines,
//! built on a Consul-compatible KV store.
//!
//! - [`KvStore`] / [`HttpKvStore`]: get, put, delete, blocking watch and
//!   transactions over HTTP
//! - [`BatchedWriter`]: write sets of any size as ordered, bounded
//!   transactions (not atomic across chunks)
//! - [`IndexTracker`]: per-resource index history with single-step rollback
//! - [`decode_best_effort`] / [`decode_all_or_partial`]: listing decoders
//! - [`SyncService`]: the domain operations on top of all of the above
mod config;
mod constants;
mod decode;
mod errors;
mod metrics;
mod model;
mod poller;
mod service;
mod store;
mod txn;
pub mod utils;
mod watch;

pub use config::*;
pub use constants::*;
pub use decode::*;
pub use errors::*;
pub use metrics::*;
pub use model::*;
pub use poller::*;
pub use service::*;
pub use store::*;
pub use txn::*;
pub use utils::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
