//! Watch/index tracking.
//!
//! Each logical resource (a key prefix) remembers the store index it last
//! saw plus one step of history. The owner polls with [`IndexTracker::poll_once`]
//! and, when it could not process what it received, calls
//! [`IndexTracker::rollback`] to have the same data delivered again.
mod index_tracker;
mod watched_resource;

pub use index_tracker::*;
pub use watched_resource::*;
