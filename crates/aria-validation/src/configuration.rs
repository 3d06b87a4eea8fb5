use crate::report::ValidationResult;
use serde_yaml_ng::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const AGENT_KEYS: &[&str] = &["role", "goal", "backstory"];
const TASK_KEYS: &[&str] = &["description", "expected_output", "agent"];

/// Checks the crew rosters on disk without building a crew.
///
/// Validates that `agents.yaml` and `tasks.yaml` exist, parse, carry the
/// required keys per entry, and that every task's `agent` names a defined
/// agent. A roster that fails its own checks is excluded from the
/// cross-reference check rather than producing cascading failures.
pub struct ConfigurationValidator {
    config_dir: PathBuf,
}

impl ConfigurationValidator {
    /// Creates a validator over the directory holding both rosters.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Runs every roster check and returns one result per check, in order.
    pub fn validate_all(&self) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let agents = self.validate_roster("agents.yaml", AGENT_KEYS, &mut results);
        let tasks = self.validate_roster("tasks.yaml", TASK_KEYS, &mut results);
        if let (Some(agents), Some(tasks)) = (agents, tasks) {
            results.push(cross_reference(&agents, &tasks));
        }
        debug!(checks = results.len(), "Configuration validation ran");
        results
    }

    fn validate_roster(
        &self,
        file: &str,
        required: &[&str],
        results: &mut Vec<ValidationResult>,
    ) -> Option<Value> {
        let check_name = file.replace('.', "_");
        let path = self.config_dir.join(file);

        if !path.is_file() {
            results.push(ValidationResult::fail(
                &check_name,
                format!("{} not found", path.display()),
            ));
            return None;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                results.push(ValidationResult::fail(
                    &check_name,
                    format!("cannot read {}: {e}", path.display()),
                ));
                return None;
            }
        };

        let value: Value = match serde_yaml_ng::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                results.push(ValidationResult::fail(
                    &check_name,
                    format!("invalid YAML: {e}"),
                ));
                return None;
            }
        };

        let Some(mapping) = value.as_mapping() else {
            results.push(ValidationResult::fail(
                &check_name,
                "top level must be a mapping of names to entries".to_string(),
            ));
            return None;
        };

        let mut problems = Vec::new();
        for (name, entry) in mapping {
            let name = name.as_str().unwrap_or("<non-string key>");
            if !entry.is_mapping() {
                problems.push(format!("'{name}' is not a mapping"));
                continue;
            }
            for key in required {
                match entry.get(*key).and_then(Value::as_str) {
                    Some(v) if !v.trim().is_empty() => {}
                    _ => problems.push(format!("'{name}' is missing '{key}'")),
                }
            }
        }

        if problems.is_empty() {
            results.push(ValidationResult::pass(
                &check_name,
                format!("{} entries valid", mapping.len()),
            ));
            Some(value)
        } else {
            results.push(ValidationResult::fail(&check_name, problems.join("; ")));
            None
        }
    }
}

fn cross_reference(agents: &Value, tasks: &Value) -> ValidationResult {
    let roster: BTreeSet<&str> = agents
        .as_mapping()
        .map(|m| m.keys().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut dangling = Vec::new();
    if let Some(tasks) = tasks.as_mapping() {
        for (task_name, entry) in tasks {
            let task_name = task_name.as_str().unwrap_or("<non-string key>");
            if let Some(agent) = entry.get("agent").and_then(Value::as_str) {
                if !roster.contains(agent) {
                    dangling.push(format!(
                        "task '{task_name}' references unknown agent '{agent}'"
                    ));
                }
            }
        }
    }

    if dangling.is_empty() {
        ValidationResult::pass(
            "task_agent_references",
            "every task references a defined agent",
        )
    } else {
        ValidationResult::fail("task_agent_references", dangling.join("; "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::report::ValidationStatus;
    use std::path::Path;

    const AGENTS: &str = "\
researcher:
  role: Researcher
  goal: Research
  backstory: Background
fact_checker:
  role: Fact Checker
  goal: Verify
  backstory: Background
summarizer:
  role: Summarizer
  goal: Summarize
  backstory: Background
writer:
  role: Writer
  goal: Write
  backstory: Background
reviewer:
  role: Reviewer
  goal: Review
  backstory: Background
";

    const TASKS: &str = "\
research_task:
  description: Research
  expected_output: Output
  agent: researcher
fact_check_task:
  description: Fact check
  expected_output: Output
  agent: fact_checker
summarize_task:
  description: Summarize
  expected_output: Output
  agent: summarizer
write_report_task:
  description: Write
  expected_output: Output
  agent: writer
review_report_task:
  description: Review
  expected_output: Output
  agent: reviewer
";

    fn write_rosters(dir: &Path, agents: &str, tasks: &str) {
        fs::write(dir.join("agents.yaml"), agents).unwrap();
        fs::write(dir.join("tasks.yaml"), tasks).unwrap();
    }

    #[test]
    fn consistent_rosters_produce_no_failures() {
        let dir = tempfile::tempdir().unwrap();
        write_rosters(dir.path(), AGENTS, TASKS);

        let results = ConfigurationValidator::new(dir.path()).validate_all();
        assert_eq!(results.len(), 3);
        for result in &results {
            assert_eq!(result.status, ValidationStatus::Pass, "{}", result.check_name);
        }
    }

    #[test]
    fn missing_tasks_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("agents.yaml"), AGENTS).unwrap();

        let results = ConfigurationValidator::new(dir.path()).validate_all();
        let tasks = results.iter().find(|r| r.check_name == "tasks_yaml").unwrap();
        assert_eq!(tasks.status, ValidationStatus::Fail);
        assert!(tasks.detail.contains("not found"));
        // Cross-reference is skipped when a roster is unusable.
        assert!(!results.iter().any(|r| r.check_name == "task_agent_references"));
    }

    #[test]
    fn malformed_yaml_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_rosters(dir.path(), "researcher: [unclosed", TASKS);

        let results = ConfigurationValidator::new(dir.path()).validate_all();
        let agents = results.iter().find(|r| r.check_name == "agents_yaml").unwrap();
        assert_eq!(agents.status, ValidationStatus::Fail);
        assert!(agents.detail.contains("invalid YAML"));
    }

    #[test]
    fn missing_required_key_fails_and_names_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let agents = "\
researcher:
  role: Researcher
  goal: Research
";
        write_rosters(dir.path(), agents, TASKS);

        let results = ConfigurationValidator::new(dir.path()).validate_all();
        let agents = results.iter().find(|r| r.check_name == "agents_yaml").unwrap();
        assert_eq!(agents.status, ValidationStatus::Fail);
        assert!(agents.detail.contains("'researcher' is missing 'backstory'"));
    }

    #[test]
    fn dangling_agent_reference_fails_cross_check() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = "\
research_task:
  description: Research
  expected_output: Output
  agent: nonexistent
";
        write_rosters(dir.path(), AGENTS, tasks);

        let results = ConfigurationValidator::new(dir.path()).validate_all();
        let refs = results
            .iter()
            .find(|r| r.check_name == "task_agent_references")
            .unwrap();
        assert_eq!(refs.status, ValidationStatus::Fail);
        assert!(refs.detail.contains("'research_task'"));
        assert!(refs.detail.contains("'nonexistent'"));
    }

    #[test]
    fn scalar_top_level_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_rosters(dir.path(), "just a string", TASKS);

        let results = ConfigurationValidator::new(dir.path()).validate_all();
        let agents = results.iter().find(|r| r.check_name == "agents_yaml").unwrap();
        assert_eq!(agents.status, ValidationStatus::Fail);
        assert!(agents.detail.contains("mapping"));
    }
}
