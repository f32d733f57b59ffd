use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;

use super::WatchedResource;
use crate::metrics::INDEX_ROLLBACKS_METRIC;
use crate::metrics::WATCH_CHANGES_METRIC;
use crate::KvEntry;
use crate::KvStore;
use crate::Result;
use crate::StoreIndex;

/// Answer of a single [`IndexTracker::poll_once`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Store index moved since the previous poll
    pub changed: bool,
    /// Index now held by the resource
    pub index: StoreIndex,
    pub entries: Vec<KvEntry>,
}

/// Long-polls one resource and owns its index history.
///
/// Meant to be driven by a single poll loop. The mutex only guards the index
/// fields; it is never held across the watch call.
pub struct IndexTracker {
    store: Arc<dyn KvStore>,
    wait_timeout: Duration,
    resource: Mutex<WatchedResource>,
}

impl IndexTracker {
    pub fn new(
        store: Arc<dyn KvStore>,
        resource: WatchedResource,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            store,
            wait_timeout,
            resource: Mutex::new(resource),
        }
    }

    /// One blocking watch on the resource.
    ///
    /// With no history the call asks for index 0 and a zero wait so existing
    /// state is returned at once. On success the resource index always
    /// advances to the store's answer.
    ///
    /// # Errors
    /// Store errors are returned untouched and leave the index as it was.
    /// [`crate::Error::NotFound`] means the prefix does not exist yet.
    pub async fn poll_once(&self) -> Result<PollOutcome> {
        let (name, prefix, recurse, since) = {
            let resource = self.resource.lock();
            (
                resource.name().to_string(),
                resource.path_prefix().to_string(),
                resource.recurse(),
                resource.last_index(),
            )
        };
        let wait = if since.is_zero() {
            Duration::ZERO
        } else {
            self.wait_timeout
        };

        debug!("[IndexTracker::poll_once] {name}: watching {prefix} since {since}");
        let response = self.store.watch(&prefix, recurse, since, wait).await?;

        let changed = self.resource.lock().advance(response.index);
        if changed {
            WATCH_CHANGES_METRIC.with_label_values(&[name.as_str()]).inc();
            debug!(
                "[IndexTracker::poll_once] {name}: index {since} -> {}",
                response.index
            );
        }

        Ok(PollOutcome {
            changed,
            index: response.index,
            entries: response.entries,
        })
    }

    /// Steps the index back one poll; see [`WatchedResource::rollback`]
    pub fn rollback(&self) -> Result<StoreIndex> {
        let mut resource = self.resource.lock();
        let from = resource.last_index();
        match resource.rollback() {
            Ok(to) => {
                INDEX_ROLLBACKS_METRIC
                    .with_label_values(&[resource.name()])
                    .inc();
                debug!(
                    "[IndexTracker::rollback] {}: index {from} -> {to}",
                    resource.name()
                );
                Ok(to)
            }
            Err(e) => {
                warn!("[IndexTracker::rollback] {e}");
                Err(e.into())
            }
        }
    }

    pub fn last_index(&self) -> StoreIndex {
        self.resource.lock().last_index()
    }

    pub fn previous_index(&self) -> Option<StoreIndex> {
        self.resource.lock().previous_index()
    }

    /// Snapshot of the resource state
    pub fn resource(&self) -> WatchedResource {
        self.resource.lock().clone()
    }
}
