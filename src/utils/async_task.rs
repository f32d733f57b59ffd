use tokio::time::sleep;
use tokio::time::timeout;
use tracing::warn;

use crate::BackoffPolicy;
use crate::Error;
use crate::Result;

/// Runs `task` until it succeeds, fails with an error `should_retry` rejects,
/// or `policy.max_retries` retries are used up. A timed out attempt is
/// reported as [`Error::RetryTimeoutError`] and goes through `should_retry`
/// like any other error.
///
/// Each attempt is bounded by `policy.timeout_ms`; the delay between attempts
/// doubles from `base_delay_ms` up to `max_delay_ms`. The last error is
/// returned when retries run out.
pub(crate) async fn task_with_timeout_and_exponential_backoff<F, T, P, R>(
    mut task: F,
    policy: BackoffPolicy,
    should_retry: R,
) -> Result<P>
where
    F: FnMut() -> T,
    T: std::future::Future<Output = Result<P>>,
    R: Fn(&Error) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let e = match timeout(policy.timeout(), task()).await {
            Ok(Ok(r)) => return Ok(r),
            Ok(Err(error)) => {
                if !should_retry(&error) {
                    return Err(error);
                }
                error
            }
            Err(elapsed) => {
                warn!("task attempt {attempt} timed out: {elapsed:?}");
                let error = Error::RetryTimeoutError;
                if !should_retry(&error) {
                    return Err(error);
                }
                error
            }
        };

        if attempt as usize > policy.max_retries {
            warn!("Task failed after {} retries", attempt - 1);
            return Err(e);
        }
        sleep(policy.delay_for(attempt)).await;
    }
}
