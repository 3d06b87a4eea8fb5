use serde::Serialize;
use std::fmt;

/// Outcome of a single check, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// The check passed.
    Pass,
    /// The check passed with a caveat the operator should know about.
    Warning,
    /// The check failed.
    Fail,
}

impl ValidationStatus {
    /// Lowercase form used in reports and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warning => "warning",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One check's outcome with a human-readable detail line.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Stable snake_case identifier of the check.
    pub check_name: String,
    /// Outcome.
    pub status: ValidationStatus,
    /// What was observed, in one line.
    pub detail: String,
}

impl ValidationResult {
    /// A passing result.
    pub fn pass(check_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            check_name: check_name.into(),
            status: ValidationStatus::Pass,
            detail: detail.into(),
        }
    }

    /// A warning result.
    pub fn warning(check_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            check_name: check_name.into(),
            status: ValidationStatus::Warning,
            detail: detail.into(),
        }
    }

    /// A failing result.
    pub fn fail(check_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            check_name: check_name.into(),
            status: ValidationStatus::Fail,
            detail: detail.into(),
        }
    }
}

/// Counts per status over one validation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    /// Checks run.
    pub total: usize,
    /// Checks that passed.
    pub passed: usize,
    /// Checks that warned.
    pub warnings: usize,
    /// Checks that failed.
    pub failed: usize,
}

/// Aggregated outcome of a validation pass. `overall_status` is the worst
/// individual status, `Pass` when no checks ran.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Worst individual status.
    pub overall_status: ValidationStatus,
    /// Counts per status.
    pub summary: ValidationSummary,
    /// Every result, in check order.
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    /// Folds individual results into a report.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let summary = ValidationSummary {
            total: results.len(),
            passed: count(&results, ValidationStatus::Pass),
            warnings: count(&results, ValidationStatus::Warning),
            failed: count(&results, ValidationStatus::Fail),
        };
        let overall_status = results
            .iter()
            .map(|r| r.status)
            .max()
            .unwrap_or(ValidationStatus::Pass);
        Self {
            overall_status,
            summary,
            results,
        }
    }

    /// True when nothing failed. Warnings do not block startup.
    pub fn is_usable(&self) -> bool {
        self.overall_status != ValidationStatus::Fail
    }
}

fn count(results: &[ValidationResult], status: ValidationStatus) -> usize {
    results.iter().filter(|r| r.status == status).count()
}
