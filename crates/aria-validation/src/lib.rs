//! Pre-flight validation for the report pipeline.
//!
//! Two validators with disjoint concerns, plus an aggregator:
//!
//! - [`EnvironmentValidator`] checks the process environment: build
//!   version, API keys, output directory writability, config layout.
//! - [`ConfigurationValidator`] checks the YAML rosters the crew is
//!   built from, including task → agent cross-references.
//! - [`ComprehensiveValidator`] runs both and folds the results into a
//!   single [`ValidationReport`].
//!
//! Validators never fail as functions. Every problem becomes a
//! [`ValidationResult`] with `Warning` or `Fail` status, so one broken
//! check cannot hide the others.

pub mod configuration;
pub mod environment;
pub mod report;

pub use configuration::ConfigurationValidator;
pub use environment::EnvironmentValidator;
pub use report::{ValidationReport, ValidationResult, ValidationStatus, ValidationSummary};

use tracing::info;

/// Runs the full validation battery: environment first, then configuration.
pub struct ComprehensiveValidator {
    environment: EnvironmentValidator,
    configuration: ConfigurationValidator,
}

impl ComprehensiveValidator {
    /// Creates a validator over the given config and output directories.
    pub fn new(
        config_dir: impl Into<std::path::PathBuf>,
        output_dir: impl Into<std::path::PathBuf>,
    ) -> Self {
        let config_dir = config_dir.into();
        Self {
            environment: EnvironmentValidator::new(config_dir.clone(), output_dir),
            configuration: ConfigurationValidator::new(config_dir),
        }
    }

    /// Builds the aggregator from already-configured validators. Used by
    /// tests that inject a fake environment lookup.
    pub fn from_parts(
        environment: EnvironmentValidator,
        configuration: ConfigurationValidator,
    ) -> Self {
        Self {
            environment,
            configuration,
        }
    }

    /// Runs every check and aggregates into a single report.
    pub fn validate(&self) -> ValidationReport {
        let mut results = self.environment.validate_all();
        results.extend(self.configuration.validate_all());
        let report = ValidationReport::from_results(results);
        info!(
            total = report.summary.total,
            failed = report.summary.failed,
            warnings = report.summary.warnings,
            status = %report.overall_status,
            "Validation complete"
        );
        report
    }
}
