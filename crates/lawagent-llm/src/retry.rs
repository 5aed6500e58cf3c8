//! Shared retry/backoff helper for the LLM and embedding clients.
//!
//! Retries only `Timeout`; all other `CoreError` variants are returned
//! immediately since retrying authentication failures or malformed-schema
//! errors cannot help.

use std::future::Future;
use std::time::Duration;

use lawagent_core::CoreError;
use tracing::warn;

/// Run `attempt` up to `max_retries + 1` times total, backing off
/// exponentially (1s, 2s, 4s, ...) between retries, but only when the
/// failure is a [`CoreError::Timeout`].
pub async fn with_retry<T, F, Fut>(max_retries: u32, mut attempt: F) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut delay = Duration::from_secs(1);
    let mut last_err = None;

    for attempt_no in 0..=max_retries {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt_no < max_retries => {
                warn!(attempt = attempt_no, delay_secs = delay.as_secs(), error = %err, "retrying after transient failure");
                tokio::time::sleep(delay).await;
                delay *= 2;
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err.unwrap_or_else(|| CoreError::Internal("retry loop exited without an error".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_ok() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, CoreError> = with_retry(3, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_timeout_up_to_max_then_fails() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, CoreError> = with_retry(2, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::Timeout {
                seconds: 1,
                detail: "slow".into(),
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, CoreError> = with_retry(3, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::provider("auth failed"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
