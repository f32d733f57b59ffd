use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;
use tracing::warn;

use super::StepOutcome;
use crate::ChainRuntimeProperties;
use crate::EngineState;
use crate::Error;
use crate::Result;
use crate::SyncService;

/// Latest state published by the poll loops. Readers never block writers.
#[derive(Default)]
pub struct FleetView {
    engines: ArcSwap<Vec<EngineState>>,
    chains_runtime: ArcSwap<ChainRuntimeProperties>,
    deployments_timestamp: AtomicU64,
}

impl FleetView {
    pub fn engines(&self) -> Arc<Vec<EngineState>> {
        self.engines.load_full()
    }

    pub fn chains_runtime(&self) -> Arc<ChainRuntimeProperties> {
        self.chains_runtime.load_full()
    }

    /// Epoch millis of the last deployment change, 0 if never seen
    pub fn deployments_timestamp(&self) -> u64 {
        self.deployments_timestamp.load(Ordering::Acquire)
    }
}

/// Watches engine reports once and publishes them when they changed.
/// A missing prefix publishes an empty fleet.
pub async fn poll_engines_state(
    service: &SyncService,
    view: &FleetView,
) -> Result<StepOutcome> {
    match service.wait_for_engines_state_update().await {
        Ok(update) if update.changed => {
            info!("[poll_engines_state] {} engine report(s)", update.value.len());
            view.engines.store(Arc::new(update.value));
            Ok(StepOutcome::Changed)
        }
        Ok(_) => Ok(StepOutcome::Unchanged),
        Err(e) if e.is_not_found() => {
            view.engines.store(Arc::new(Vec::new()));
            Ok(StepOutcome::Absent)
        }
        Err(e) => Err(e),
    }
}

/// Watches the deployments timestamp once
pub async fn poll_deployments_update(
    service: &SyncService,
    view: &FleetView,
) -> Result<StepOutcome> {
    match service.wait_for_deployments_update().await {
        Ok(update) if update.changed => {
            info!("[poll_deployments_update] deployments modified at {}", update.value);
            view.deployments_timestamp.store(update.value, Ordering::Release);
            Ok(StepOutcome::Changed)
        }
        Ok(_) => Ok(StepOutcome::Unchanged),
        Err(e) if e.is_not_found() => Ok(StepOutcome::Absent),
        Err(e) => Err(e),
    }
}

/// Watches chain runtime properties once.
///
/// A partially decodable listing is not published: the index is rolled
/// back so the listing is delivered again on the next iteration, and the
/// error is returned so the loop backs off first.
pub async fn poll_chains_runtime(
    service: &SyncService,
    view: &FleetView,
) -> Result<StepOutcome> {
    match service.wait_for_chain_runtime_config().await {
        Ok(update) if update.changed => {
            info!("[poll_chains_runtime] runtime properties of {} chain(s)", update.value.len());
            view.chains_runtime.store(Arc::new(update.value));
            Ok(StepOutcome::Changed)
        }
        Ok(_) => Ok(StepOutcome::Unchanged),
        Err(e) if e.is_not_found() => {
            view.chains_runtime.store(Arc::new(ChainRuntimeProperties::new()));
            Ok(StepOutcome::Absent)
        }
        Err(e @ Error::PartialDecode(_)) => {
            warn!("[poll_chains_runtime] {e}, requesting redelivery");
            service.rollback_chains_runtime_config_last_index()?;
            Err(e)
        }
        Err(e) => Err(e),
    }
}
