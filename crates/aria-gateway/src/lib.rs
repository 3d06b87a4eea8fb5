//! HTTP gateway over the pipeline and its operational surfaces.
//!
//! Routes: `/` (usage hint), `/health`, `/health/deep` (adds live provider
//! probes), `/metrics`, and `POST /run-crew`. All of them sit behind a
//! request-tracking layer feeding the metrics collector, and `/run-crew`
//! goes through the [`Supervisor`], which refuses work until startup
//! validation has passed.

/// Router, handlers, and shared state.
pub mod server;
/// Guarded startup and guarded pipeline entry.
pub mod supervisor;

pub use server::{AppState, GatewayServer};
pub use supervisor::Supervisor;
