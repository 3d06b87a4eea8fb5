use aria_core::{AriaError, AriaResult};
use chrono::{Datelike, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// The five crew roles. Execution order is fixed in code, not configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Gathers raw findings via academic search.
    Researcher,
    /// Verifies claims against news sources.
    FactChecker,
    /// Condenses verified findings into structured notes.
    Summarizer,
    /// Expands notes into a full markdown report.
    Writer,
    /// Grammar and clarity pass over the finished report.
    Reviewer,
}

/// The fixed hand-off order of the pipeline.
pub const PIPELINE: [AgentRole; 5] = [
    AgentRole::Researcher,
    AgentRole::FactChecker,
    AgentRole::Summarizer,
    AgentRole::Writer,
    AgentRole::Reviewer,
];

impl AgentRole {
    /// The agent's key in `agents.yaml`.
    pub fn key(&self) -> &'static str {
        match self {
            AgentRole::Researcher => "researcher",
            AgentRole::FactChecker => "fact_checker",
            AgentRole::Summarizer => "summarizer",
            AgentRole::Writer => "writer",
            AgentRole::Reviewer => "reviewer",
        }
    }

    /// The task bound to this role in `tasks.yaml`.
    pub fn task_name(&self) -> &'static str {
        match self {
            AgentRole::Researcher => "research_task",
            AgentRole::FactChecker => "fact_check_task",
            AgentRole::Summarizer => "summarize_task",
            AgentRole::Writer => "write_report_task",
            AgentRole::Reviewer => "review_report_task",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            AgentRole::Researcher => 0,
            AgentRole::FactChecker => 1,
            AgentRole::Summarizer => 2,
            AgentRole::Writer => 3,
            AgentRole::Reviewer => 4,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One agent's persona from `agents.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Display role, e.g. "Senior Researcher".
    pub role: String,
    /// What the agent is trying to achieve.
    pub goal: String,
    /// Persona background handed to the underlying model.
    pub backstory: String,
}

/// One task definition from `tasks.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// What the step should do. May contain `{topic}` / `{current_year}`.
    pub description: String,
    /// Shape of the expected result.
    pub expected_output: String,
    /// Key of the agent this task is assigned to.
    pub agent: String,
}

/// Both rosters, bound to the fixed pipeline order at load time.
///
/// Loading fails with a configuration error when either file is missing or
/// malformed, a role or task is absent, a field is empty, or a task is
/// assigned to the wrong agent. Nothing is validated lazily.
#[derive(Debug, Clone)]
pub struct CrewConfig {
    agents: Vec<AgentSpec>,
    tasks: Vec<TaskSpec>,
}

impl CrewConfig {
    /// Loads and binds `agents.yaml` and `tasks.yaml` from `config_dir`.
    pub fn load(config_dir: &Path) -> AriaResult<Self> {
        let agents: HashMap<String, AgentSpec> = load_yaml(config_dir, "agents.yaml")?;
        let tasks: HashMap<String, TaskSpec> = load_yaml(config_dir, "tasks.yaml")?;

        let mut bound_agents = Vec::with_capacity(PIPELINE.len());
        let mut bound_tasks = Vec::with_capacity(PIPELINE.len());
        for role in PIPELINE {
            let agent = agents.get(role.key()).ok_or_else(|| {
                AriaError::Config(format!("agents.yaml is missing '{}'", role.key()))
            })?;
            require_filled(role.key(), "role", &agent.role)?;
            require_filled(role.key(), "goal", &agent.goal)?;
            require_filled(role.key(), "backstory", &agent.backstory)?;

            let task = tasks.get(role.task_name()).ok_or_else(|| {
                AriaError::Config(format!("tasks.yaml is missing '{}'", role.task_name()))
            })?;
            require_filled(role.task_name(), "description", &task.description)?;
            require_filled(role.task_name(), "expected_output", &task.expected_output)?;
            if task.agent != role.key() {
                return Err(AriaError::Config(format!(
                    "task '{}' must be assigned to '{}', found '{}'",
                    role.task_name(),
                    role.key(),
                    task.agent
                )));
            }

            bound_agents.push(agent.clone());
            bound_tasks.push(task.clone());
        }

        Ok(Self {
            agents: bound_agents,
            tasks: bound_tasks,
        })
    }

    /// The agent bound to `role`.
    pub fn agent(&self, role: AgentRole) -> &AgentSpec {
        &self.agents[role.index()]
    }

    /// The task bound to `role`.
    pub fn task(&self, role: AgentRole) -> &TaskSpec {
        &self.tasks[role.index()]
    }
}

/// Substitutes `{topic}` and `{current_year}` placeholders.
pub fn interpolate(text: &str, topic: &str) -> String {
    text.replace("{topic}", topic)
        .replace("{current_year}", &Utc::now().year().to_string())
}

fn load_yaml<T: DeserializeOwned>(config_dir: &Path, file: &str) -> AriaResult<T> {
    let path = config_dir.join(file);
    let contents = fs::read_to_string(&path)
        .map_err(|e| AriaError::Config(format!("cannot read {}: {e}", path.display())))?;
    serde_yaml_ng::from_str(&contents)
        .map_err(|e| AriaError::Config(format!("{file}: {e}")))
}

fn require_filled(entry: &str, field: &str, value: &str) -> AriaResult<()> {
    if value.trim().is_empty() {
        return Err(AriaError::Config(format!(
            "'{entry}' has an empty '{field}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const AGENTS_YAML: &str = "\
researcher:
  role: Senior Researcher
  goal: Uncover developments in {topic}
  backstory: A curious analyst.
fact_checker:
  role: Fact Checker
  goal: Verify claims about {topic}
  backstory: A sceptic with sources.
summarizer:
  role: Summarizer
  goal: Condense findings
  backstory: Hates filler words.
writer:
  role: Report Writer
  goal: Write the report
  backstory: A structured thinker.
reviewer:
  role: Reviewer
  goal: Polish the report
  backstory: A grammar pedant.
";

    pub(crate) const TASKS_YAML: &str = "\
research_task:
  description: Research {topic} as of {current_year}
  expected_output: Raw findings
  agent: researcher
fact_check_task:
  description: Verify the findings about {topic}
  expected_output: Checked findings
  agent: fact_checker
summarize_task:
  description: Summarize the verified findings
  expected_output: Structured notes
  agent: summarizer
write_report_task:
  description: Write a markdown report on {topic}
  expected_output: Full report
  agent: writer
review_report_task:
  description: Review the report for grammar and clarity
  expected_output: Polished report
  agent: reviewer
";

    pub(crate) fn write_config(dir: &Path) {
        fs::write(dir.join("agents.yaml"), AGENTS_YAML).unwrap();
        fs::write(dir.join("tasks.yaml"), TASKS_YAML).unwrap();
    }

    #[test]
    fn loads_and_binds_both_rosters() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path());

        let config = CrewConfig::load(dir.path()).unwrap();
        assert_eq!(config.agent(AgentRole::Researcher).role, "Senior Researcher");
        assert_eq!(config.task(AgentRole::Writer).agent, "writer");
        assert_eq!(
            config.task(AgentRole::Reviewer).expected_output,
            "Polished report"
        );
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, AriaError::Config(_)));
        assert!(err.to_string().contains("agents.yaml"));
    }

    #[test]
    fn missing_role_is_named_in_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let without_reviewer: String = AGENTS_YAML
            .lines()
            .take_while(|line| !line.starts_with("reviewer:"))
            .map(|line| format!("{line}\n"))
            .collect();
        fs::write(dir.path().join("agents.yaml"), without_reviewer).unwrap();
        fs::write(dir.path().join("tasks.yaml"), TASKS_YAML).unwrap();

        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("'reviewer'"));
    }

    #[test]
    fn missing_field_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        // researcher lacks a backstory; serde rejects the shape.
        let agents = "\
researcher:
  role: Senior Researcher
  goal: Research
";
        fs::write(dir.path().join("agents.yaml"), agents).unwrap();
        fs::write(dir.path().join("tasks.yaml"), TASKS_YAML).unwrap();

        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, AriaError::Config(_)));
    }

    #[test]
    fn misassigned_task_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("agents.yaml"), AGENTS_YAML).unwrap();
        let tasks = TASKS_YAML.replacen("agent: researcher", "agent: writer", 1);
        fs::write(dir.path().join("tasks.yaml"), tasks).unwrap();

        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("research_task"));
        assert!(err.to_string().contains("'researcher'"));
    }

    #[test]
    fn empty_field_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let agents = AGENTS_YAML.replacen("backstory: A curious analyst.", "backstory: \"\"", 1);
        fs::write(dir.path().join("agents.yaml"), agents).unwrap();
        fs::write(dir.path().join("tasks.yaml"), TASKS_YAML).unwrap();

        let err = CrewConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("backstory"));
    }

    #[test]
    fn interpolate_substitutes_both_placeholders() {
        let year = Utc::now().year().to_string();
        let text = interpolate("Research {topic} as of {current_year}", "rust async");
        assert_eq!(text, format!("Research rust async as of {year}"));
    }

    #[test]
    fn interpolate_leaves_unknown_placeholders() {
        assert_eq!(interpolate("keep {other} intact", "x"), "keep {other} intact");
    }

    #[test]
    fn pipeline_order_is_fixed() {
        assert_eq!(PIPELINE[0], AgentRole::Researcher);
        assert_eq!(PIPELINE[4], AgentRole::Reviewer);
        assert_eq!(AgentRole::FactChecker.task_name(), "fact_check_task");
        assert_eq!(AgentRole::FactChecker.to_string(), "fact_checker");
    }
}
