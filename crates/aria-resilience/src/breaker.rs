use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Operational mode of a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed = 0,
    /// Failing fast, calls are rejected without invoking the operation.
    Open = 1,
    /// One trial call permitted; its outcome decides closed vs open.
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open,
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; the operation was not invoked.
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen {
        /// Name of the breaker that rejected the call.
        name: String,
    },

    /// The operation was invoked and failed; the failure was recorded.
    #[error("operation failed: {0}")]
    Operation(E),
}

/// Sheds load from a failing downstream dependency.
///
/// Consecutive failures beyond `failure_threshold` open the circuit; while
/// open, calls fail fast without invoking the wrapped operation. Once
/// `recovery_timeout` has elapsed since the last failure the next call runs
/// as a half-open trial whose outcome alone decides whether the circuit
/// closes again.
pub struct CircuitBreaker {
    name: String,
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    last_failure_time: Mutex<Option<Instant>>,
    failure_threshold: u32,
    recovery_timeout: Duration,
}

impl CircuitBreaker {
    /// Creates a closed breaker with the given thresholds.
    pub fn new(
        name: impl Into<String>,
        failure_threshold: u32,
        recovery_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            state: AtomicU8::new(CircuitState::Closed as u8),
            consecutive_failures: AtomicU32::new(0),
            last_failure_time: Mutex::new(None),
            failure_threshold,
            recovery_timeout,
        }
    }

    /// Current state, observable at all times.
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Current run of consecutive failures.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Name of the breaker, used in logs and rejection errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `operation` under the breaker.
    ///
    /// Returns the operation's output, rejects with
    /// [`CircuitBreakerError::CircuitOpen`] while the circuit is open, or
    /// propagates the operation's own error as
    /// [`CircuitBreakerError::Operation`].
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.allow_call() {
            return Err(CircuitBreakerError::CircuitOpen {
                name: self.name.clone(),
            });
        }

        match operation().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(CircuitBreakerError::Operation(e))
            }
        }
    }

    fn allow_call(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let last_failure = *self.last_failure_time.lock();
                match last_failure {
                    Some(at) if at.elapsed() >= self.recovery_timeout => {
                        self.state
                            .store(CircuitState::HalfOpen as u8, Ordering::Release);
                        info!(breaker = %self.name, "Circuit breaker half-open, trial call permitted");
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    fn record_success(&self) {
        let was_half_open = self.state() == CircuitState::HalfOpen;
        self.consecutive_failures.store(0, Ordering::Release);
        if was_half_open {
            self.state
                .store(CircuitState::Closed as u8, Ordering::Release);
            *self.last_failure_time.lock() = None;
            info!(breaker = %self.name, "Circuit breaker closed (trial call succeeded)");
        }
    }

    fn record_failure(&self) {
        *self.last_failure_time.lock() = Some(Instant::now());

        match self.state() {
            CircuitState::HalfOpen => {
                self.state.store(CircuitState::Open as u8, Ordering::Release);
                warn!(breaker = %self.name, "Circuit breaker reopened (trial call failed)");
            }
            CircuitState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.failure_threshold {
                    self.state.store(CircuitState::Open as u8, Ordering::Release);
                    warn!(
                        breaker = %self.name,
                        consecutive_failures = failures,
                        failure_threshold = self.failure_threshold,
                        "Circuit breaker opened (failing fast)"
                    );
                }
            }
            CircuitState::Open => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    fn breaker(threshold: u32, recovery_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new("test", threshold, Duration::from_millis(recovery_ms))
    }

    #[tokio::test]
    async fn closed_breaker_passes_value_through() {
        let cb = breaker(3, 100);
        assert_eq!(cb.state(), CircuitState::Closed);

        let result = cb.call(|| async { Ok::<_, String>("payload") }).await;
        assert_eq!(result.unwrap(), "payload");
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn opens_after_threshold_consecutive_failures() {
        let cb = breaker(2, 100);

        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 1);

        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn open_breaker_rejects_without_invoking() {
        let cb = breaker(1, 10_000);
        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.state(), CircuitState::Open);

        let invoked = Arc::new(AtomicU32::new(0));
        let invoked2 = invoked.clone();
        let result = cb
            .call(|| async move {
                invoked2.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("never reached")
            })
            .await;

        assert!(matches!(
            result,
            Err(CircuitBreakerError::CircuitOpen { .. })
        ));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_resets_consecutive_failures() {
        let cb = breaker(3, 100);

        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.consecutive_failures(), 2);

        let _ = cb.call(|| async { Ok::<_, String>(()) }).await;
        assert_eq!(cb.consecutive_failures(), 0);

        // A fresh run of failures is needed to open.
        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.state(), CircuitState::Closed);
        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn recovers_through_half_open_on_success() {
        let cb = breaker(1, 50);
        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(60)).await;

        let result = cb.call(|| async { Ok::<_, String>("recovered") }).await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn half_open_failure_reopens() {
        let cb = breaker(1, 50);
        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(60)).await;

        let _ = cb.call(|| async { Err::<(), _>("still down") }).await;
        assert_eq!(cb.state(), CircuitState::Open);

        // The reopened circuit keeps rejecting until the recovery window
        // elapses again.
        let result = cb.call(|| async { Ok::<_, String>(()) }).await;
        assert!(matches!(
            result,
            Err(CircuitBreakerError::CircuitOpen { .. })
        ));
    }

    #[tokio::test]
    async fn rejection_before_recovery_window() {
        let cb = breaker(1, 10_000);
        let _ = cb.call(|| async { Err::<(), _>("boom") }).await;

        let result = cb.call(|| async { Ok::<_, String>(()) }).await;
        assert!(matches!(
            result,
            Err(CircuitBreakerError::CircuitOpen { name }) if name == "test"
        ));
    }

    #[test]
    fn state_round_trips_through_u8() {
        assert_eq!(CircuitState::from(CircuitState::Closed as u8), CircuitState::Closed);
        assert_eq!(CircuitState::from(CircuitState::Open as u8), CircuitState::Open);
        assert_eq!(
            CircuitState::from(CircuitState::HalfOpen as u8),
            CircuitState::HalfOpen
        );
        // Unknown values degrade to the safest state.
        assert_eq!(CircuitState::from(9), CircuitState::Open);
    }

    #[test]
    fn state_display_is_snake_case() {
        assert_eq!(CircuitState::Closed.to_string(), "closed");
        assert_eq!(CircuitState::HalfOpen.to_string(), "half_open");
    }
}
