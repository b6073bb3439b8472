//! Retry executor
//!
//! Re-invokes an operation while the [`RetryPolicy`] allows it, sleeping for
//! the policy's backoff delay in between. Non-transient failures and the
//! final failure after the last attempt are returned unmodified.

use std::future::Future;

use log::{debug, warn};
use searchhub_core::{RetryPolicy, SearchError};

pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("Succeeded on attempt {attempt}/{}", policy.max_attempts);
                }
                return Ok(value);
            }
            Err(err) if policy.should_retry(&err, attempt) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "Attempt {attempt}/{} failed ({err}); retrying in {delay:?}",
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                debug!("Giving up after attempt {attempt}: {err}");
                return Err(err);
            }
        }
    }
}
