//! Fault-isolation helpers for calls to external inference and search APIs.
//!
//! Outbound calls from the pipeline pass through two layers: a
//! [`TimeoutHandler`] that bounds how long a single attempt may run and
//! retries transient failures, and a [`CircuitBreaker`] that sheds load from
//! a dependency that keeps failing. The [`ConnectivityProber`] reuses the
//! timeout layer to answer "can we reach the provider at all" for deep
//! health checks.
//!
//! # Main types
//!
//! - [`CircuitBreaker`] / [`CircuitState`] — Closed/open/half-open fault isolation.
//! - [`TimeoutHandler`] — Bounded waiting with a typed timeout failure and retries.
//! - [`ConnectivityProber`] — Endpoint battery for API reachability reports.

/// Closed/open/half-open circuit breaker around async operations.
pub mod breaker;
/// API endpoint reachability probes.
pub mod prober;
/// Timeout wrapping and bounded retries for async operations.
pub mod timeout;

pub use breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
pub use prober::{ConnectivityProber, ProbeReport, ProbeResult, ProbeTarget};
pub use timeout::{TimeoutError, TimeoutHandler};
