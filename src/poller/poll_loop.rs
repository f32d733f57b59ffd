use std::future::Future;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::BackoffPolicy;
use crate::Error;
use crate::Result;

/// What one loop iteration observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Changed,
    Unchanged,
    /// The resource does not exist yet; the loop idles before looking again
    Absent,
}

/// Spawns a task calling `step` until `shutdown` fires.
///
/// A failing step never ends the loop: the error is logged and the next
/// iteration starts after `backoff.delay_for(consecutive_failures)`. An
/// [`StepOutcome::Absent`] iteration waits `backoff.base_delay_ms`. Shutdown
/// drops the in-flight step, which closes its connection.
pub fn spawn_poll_loop<F, Fut>(
    name: impl Into<String>,
    mut step: F,
    backoff: BackoffPolicy,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<StepOutcome>> + Send + 'static,
{
    let name = name.into();
    tokio::spawn(async move {
        info!("[{name}] poll loop started");
        let mut failures: u32 = 0;

        loop {
            let result = tokio::select! {
                _ = shutdown.changed() => break,
                result = step() => result,
            };

            let delay = match result {
                Ok(StepOutcome::Absent) => {
                    failures = 0;
                    debug!("[{name}] resource absent, idling");
                    Some(backoff.delay_for(1))
                }
                Ok(outcome) => {
                    failures = 0;
                    debug!("[{name}] step finished: {outcome:?}");
                    None
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    error!("[{name}] poll failed ({failures} in a row): {e}");
                    Some(backoff.delay_for(failures))
                }
            };

            if let Some(delay) = delay {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = sleep(delay) => {}
                }
            }
        }

        info!("[{name}] poll loop stopped");
    })
}

/// Waits for every loop to end.
///
/// All loops are awaited even when one of them panicked or was aborted; the
/// first such failure is returned as [`Error::TaskFailed`].
pub async fn join_poll_loops(handles: Vec<JoinHandle<()>>) -> Result<()> {
    let mut aborted = None;
    for result in join_all(handles).await {
        if let Err(e) = result {
            error!("poll loop aborted: {:?}", e);
            aborted.get_or_insert(Error::TaskFailed(e));
        }
    }
    aborted.map_or(Ok(()), Err)
}
