use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Error returned by [`TimeoutHandler::with_timeout_and_retry`].
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    /// The attempt did not complete within the allowed wait.
    #[error("operation timed out after {timeout:?}")]
    TimedOut {
        /// The wait that was exceeded.
        timeout: Duration,
    },

    /// Every attempt failed; carries the last failure.
    #[error("operation failed after {attempts} attempt(s): {source}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        source: E,
    },
}

/// Wraps async operations with a maximum wait and a bounded retry count.
///
/// A stall becomes a typed [`TimeoutError::TimedOut`] and is not retried;
/// any other failure is retried up to the configured bound, after which the
/// last error propagates as [`TimeoutError::Exhausted`]. Attempts are
/// independent: the factory closure builds a fresh future each time.
///
/// Cancellation on timeout is cooperative: the in-flight future is dropped,
/// which cancels it at its next await point. Work already handed off (an
/// HTTP request in flight at the remote end) may still complete there.
#[derive(Debug, Clone)]
pub struct TimeoutHandler {
    default_timeout: Duration,
    max_retries: u32,
}

impl TimeoutHandler {
    /// Creates a handler with the given defaults for [`TimeoutHandler::run`].
    pub fn new(default_timeout: Duration, max_retries: u32) -> Self {
        Self {
            default_timeout,
            max_retries,
        }
    }

    /// The wait applied by [`TimeoutHandler::run`].
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// The retry bound applied by [`TimeoutHandler::run`].
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Runs `make_fut` under the handler's configured defaults.
    pub async fn run<F, Fut, T, E>(&self, make_fut: F) -> Result<T, TimeoutError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.with_timeout_and_retry(make_fut, self.default_timeout, self.max_retries)
            .await
    }

    /// Runs `make_fut` with an explicit wait and retry bound.
    ///
    /// `retries` is the number of additional attempts after the first, so
    /// `retries = 0` means exactly one attempt.
    pub async fn with_timeout_and_retry<F, Fut, T, E>(
        &self,
        mut make_fut: F,
        timeout: Duration,
        retries: u32,
    ) -> Result<T, TimeoutError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            match tokio::time::timeout(timeout, make_fut()).await {
                Err(_) => {
                    warn!(attempt, timeout_ms = timeout.as_millis() as u64, "Attempt timed out");
                    return Err(TimeoutError::TimedOut { timeout });
                }
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    if attempt < retries {
                        warn!(attempt, error = %e, "Attempt failed, retrying");
                        attempt += 1;
                    } else {
                        return Err(TimeoutError::Exhausted {
                            attempts: attempt + 1,
                            source: e,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn handler() -> TimeoutHandler {
        TimeoutHandler::new(Duration::from_millis(200), 2)
    }

    #[tokio::test]
    async fn fast_operation_returns_value_unchanged() {
        let result = handler()
            .with_timeout_and_retry(
                || async { Ok::<_, String>(42) },
                Duration::from_millis(100),
                0,
            )
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn slow_operation_times_out() {
        let result = handler()
            .with_timeout_and_retry(
                || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok::<_, String>("too late")
                },
                Duration::from_millis(20),
                3,
            )
            .await;
        assert!(matches!(result, Err(TimeoutError::TimedOut { .. })));
    }

    #[tokio::test]
    async fn timeout_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result = handler()
            .with_timeout_and_retry(
                move || {
                    let calls = calls2.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok::<_, String>(())
                    }
                },
                Duration::from_millis(20),
                5,
            )
            .await;

        assert!(matches!(result, Err(TimeoutError::TimedOut { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result = handler()
            .with_timeout_and_retry(
                move || {
                    let calls = calls2.clone();
                    async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        if n < 2 {
                            Err("transient".to_string())
                        } else {
                            Ok("finally")
                        }
                    }
                },
                Duration::from_millis(100),
                2,
            )
            .await;

        assert_eq!(result.unwrap(), "finally");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_propagate_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();

        let result: Result<(), _> = handler()
            .with_timeout_and_retry(
                move || {
                    let calls = calls2.clone();
                    async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        Err(format!("failure {n}"))
                    }
                },
                Duration::from_millis(100),
                2,
            )
            .await;

        match result {
            Err(TimeoutError::Exhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert_eq!(source, "failure 2");
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_uses_configured_defaults() {
        let h = TimeoutHandler::new(Duration::from_millis(20), 0);
        assert_eq!(h.default_timeout(), Duration::from_millis(20));
        assert_eq!(h.max_retries(), 0);

        let result = h
            .run(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, String>(())
            })
            .await;
        assert!(matches!(result, Err(TimeoutError::TimedOut { .. })));
    }
}
