//! Bounded retry with exponential backoff for transient S3 failures
//!
//! Only errors reported as retryable (throttling, 5xx, transport) are
//! retried; not-found and API rejections are returned on the first attempt.

use bucketflow_cloud::{GatewayResult, RetryConfig};
use std::future::Future;
use tracing::warn;

/// Execute a gateway operation, retrying transient failures.
///
/// Returns the last error once `max_attempts` is exhausted.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> GatewayResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < config.max_attempts.max(1) => {
                let delay = config.delay_for(attempt);
                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "S3 call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketflow_cloud::GatewayError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = &AtomicU32::new(0);
        let result = with_retry(&fast(3), "head_bucket", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(GatewayError::Throttled("SlowDown".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: GatewayResult<()> = with_retry(&fast(2), "put_bucket_tags", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::Transport("reset".into()))
        })
        .await;

        assert!(matches!(result, Err(GatewayError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: GatewayResult<()> = with_retry(&fast(5), "head_bucket", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::NotFound("NoSuchBucket".into()))
        })
        .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_config() {
        let calls = &AtomicU32::new(0);
        let _ = with_retry(&RetryConfig::none(), "delete_bucket", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(GatewayError::Throttled("SlowDown".into()))
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
