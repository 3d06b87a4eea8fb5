//! Runtime observability for the report pipeline.
//!
//! Two halves, both cheap enough to leave on in production:
//!
//! - [`ResourceMonitor`] samples host CPU and memory on a background task
//!   and keeps a bounded history of [`ResourceSnapshot`]s.
//! - [`MetricsCollector`] counts requests and crew executions with atomic
//!   counters, read out by the gateway's `/metrics` endpoint.

pub mod metrics;
pub mod resource;

pub use metrics::{MetricsCollector, MetricsView};
pub use resource::{ResourceMonitor, ResourceSnapshot};
