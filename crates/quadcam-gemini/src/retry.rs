//! Fixed-delay retry for model calls.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::GeminiError;

/// Retry behavior for one kind of call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl RetryPolicy {
    pub fn new(operation_name: impl Into<String>, max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            operation_name: operation_name.into(),
        }
    }
}

/// Run `operation`, retrying only while it fails with a transient error and
/// attempts remain. Returns the last error once attempts are exhausted.
pub async fn retry_transient<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Result<T, GeminiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, GeminiError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    "{} attempt {}/{} failed, retrying in {:?}: {}",
                    policy.operation_name, attempt, max_attempts, policy.delay, e
                );
                metrics::counter!("quadcam_model_retries_total").increment(1);
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new("test", max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_transient(&policy(5), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(GeminiError::api(503, "busy"))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_transient(&policy(4), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(GeminiError::api(500, "boom"))
        })
        .await;

        assert_eq!(result.unwrap_err().status_code(), Some(500));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_transient(&policy(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(GeminiError::api(403, "forbidden"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), _> = retry_transient(&policy(0), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(GeminiError::api(503, "busy"))
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
