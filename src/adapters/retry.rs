//! Retry policy shared by the HTTP adapters
//!
//! Fixed backoff for transient failures, a longer fixed wait after HTTP 429,
//! and one attempt cap covering both.

use crate::config::RetryConfig;
use crate::domain::HttpError;
use crate::log_retry_attempt;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
    rate_limit_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration, rate_limit_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            rate_limit_backoff,
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// cap is reached. The last error is returned on exhaustion.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, HttpError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, HttpError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    tracing::warn!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %e,
                        "Giving up after exhausting retries"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = if e.is_rate_limited() {
                        self.rate_limit_backoff
                    } else {
                        self.backoff
                    };
                    log_retry_attempt!(
                        operation_name,
                        attempt,
                        self.max_attempts,
                        delay.as_millis() as u64,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.backoff(),
            config.rate_limit_backoff(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(5), Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failure() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = policy()
            .run("test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(HttpError::Timeout("slow".to_string()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_at_attempt_cap() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = policy()
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(HttpError::ServerError {
                    status: 502,
                    message: "bad gateway".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(HttpError::ServerError { status: 502, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = policy()
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(HttpError::ClientError {
                    status: 400,
                    message: "bad request".to_string(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_uses_long_backoff() {
        let start = tokio::time::Instant::now();
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = policy()
            .run("test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(HttpError::RateLimited("429".to_string()))
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert!(start.elapsed() >= Duration::from_secs(30));
    }
}
