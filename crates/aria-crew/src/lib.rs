//! The research crew: configuration, tools, and the sequential pipeline.
//!
//! A crew is five fixed roles run in order, researcher through reviewer,
//! each backed by one HTTP tool. Personas and task briefs come from
//! `agents.yaml` / `tasks.yaml`; execution order and role→tool binding are
//! code, not configuration. The pipeline is exposed through the
//! [`CrewRuntime`] trait so the gateway can run a real [`Crew`] in
//! production and a fake in tests.

/// YAML rosters and the fixed pipeline order.
pub mod config;
/// Sequential pipeline execution over the toolset.
pub mod pipeline;
/// HTTP tools, one per role.
pub mod tools;

pub use config::{AgentRole, AgentSpec, CrewConfig, TaskSpec, PIPELINE};
pub use pipeline::{Crew, CrewRunReport, CrewRuntime, StepReport};
pub use tools::Tool;
