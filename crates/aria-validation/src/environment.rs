use crate::report::ValidationResult;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// API keys the pipeline's tools read, with accepted aliases. Absence is a
/// warning, never a failure: keyless tools degrade to pass-through.
const API_KEYS: &[(&str, &[&str])] = &[
    ("hf_api_key", &["HF_API_KEY", "HF_TOKEN"]),
    ("rapidapi_key", &["RAPIDAPI_KEY"]),
    ("openai_api_key", &["OPENAI_API_KEY"]),
];

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Checks the process environment the pipeline will run in.
///
/// The check battery is fixed and ordered: build version, one result per
/// API key, output directory writability, config directory layout.
pub struct EnvironmentValidator {
    config_dir: PathBuf,
    output_dir: PathBuf,
    env: EnvLookup,
}

impl EnvironmentValidator {
    /// Creates a validator reading keys from the real process environment.
    pub fn new(config_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            output_dir: output_dir.into(),
            env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replaces the environment lookup. Tests use this to avoid touching
    /// real process environment variables.
    pub fn with_env_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.env = Box::new(lookup);
        self
    }

    /// Runs the full battery and returns one result per check, in order.
    pub fn validate_all(&self) -> Vec<ValidationResult> {
        let mut results = vec![self.validate_build_version()];
        results.extend(self.validate_api_keys());
        results.push(self.validate_output_directory());
        results.push(self.validate_config_layout());
        debug!(checks = results.len(), "Environment validation ran");
        results
    }

    fn validate_build_version(&self) -> ValidationResult {
        ValidationResult::pass(
            "build_version",
            format!("aria {}", env!("CARGO_PKG_VERSION")),
        )
    }

    fn validate_api_keys(&self) -> Vec<ValidationResult> {
        API_KEYS
            .iter()
            .map(|(check_name, aliases)| {
                let configured = aliases
                    .iter()
                    .find(|name| matches!((self.env)(name), Some(v) if !v.is_empty()));
                match configured {
                    Some(name) => {
                        ValidationResult::pass(*check_name, format!("{name} is configured"))
                    }
                    None => ValidationResult::warning(
                        *check_name,
                        format!(
                            "{} not set; dependent tools run in pass-through mode",
                            aliases.join(" / ")
                        ),
                    ),
                }
            })
            .collect()
    }

    fn validate_output_directory(&self) -> ValidationResult {
        if let Err(e) = fs::create_dir_all(&self.output_dir) {
            return ValidationResult::fail(
                "output_directory",
                format!("cannot create {}: {e}", self.output_dir.display()),
            );
        }
        let probe = self.output_dir.join(".write-probe");
        match fs::write(&probe, b"probe") {
            Ok(()) => {
                let _ = fs::remove_file(&probe);
                ValidationResult::pass(
                    "output_directory",
                    format!("{} is writable", self.output_dir.display()),
                )
            }
            Err(e) => ValidationResult::fail(
                "output_directory",
                format!("{} is not writable: {e}", self.output_dir.display()),
            ),
        }
    }

    fn validate_config_layout(&self) -> ValidationResult {
        if self.config_dir.is_dir() {
            ValidationResult::pass(
                "config_layout",
                format!("{} exists", self.config_dir.display()),
            )
        } else {
            ValidationResult::fail(
                "config_layout",
                format!("configuration directory {} not found", self.config_dir.display()),
            )
        }
    }
}
