use super::score::Deduction;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Success,
    Failure,
    #[default]
    Unknown,
}

impl BuildStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildStatus::Success => "success",
            BuildStatus::Failure => "failure",
            BuildStatus::Unknown => "unknown",
        }
    }

    /// Accepts the common spellings CI systems use.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "success" | "succeeded" | "passed" | "pass" | "ok" => Some(BuildStatus::Success),
            "failure" | "failed" | "fail" | "error" => Some(BuildStatus::Failure),
            "unknown" | "skipped" => Some(BuildStatus::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildResult {
    pub status: BuildStatus,
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests / lint / security / coverage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestResults {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total: u32,
}

impl TestResults {
    /// Fill in `total` when the source only reported the parts.
    pub fn normalized(mut self) -> Self {
        let parts = self
            .passed
            .saturating_add(self.failed)
            .saturating_add(self.skipped);
        if self.total < parts {
            self.total = parts;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintResults {
    pub errors: u32,
    pub warnings: u32,
}

/// Finding counts by severity, in the `npm audit` vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityResults {
    pub critical: u32,
    pub high: u32,
    pub moderate: u32,
    pub low: u32,
}

impl SecurityResults {
    pub fn total(&self) -> u32 {
        self.critical
            .saturating_add(self.high)
            .saturating_add(self.moderate)
            .saturating_add(self.low)
    }
}

/// Percentages, 0–100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageResults {
    pub lines: f64,
    pub statements: f64,
    pub functions: f64,
    pub branches: f64,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    Warning,
    Failure,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Success => "success",
            OverallStatus::Warning => "warning",
            OverallStatus::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub commit: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<String>,
    /// RFC 3339.
    pub generated_at: String,
}

/// The collected signals. Scoring happens in [`CiReport::assemble`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CiInputs {
    pub meta: ReportMeta,
    pub build: BuildResult,
    pub tests: TestResults,
    pub lint: LintResults,
    pub security: SecurityResults,
    pub coverage: Option<CoverageResults>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiReport {
    pub meta: ReportMeta,
    pub build: BuildResult,
    pub tests: TestResults,
    pub lint: LintResults,
    pub security: SecurityResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageResults>,
    pub score: u32,
    pub status: OverallStatus,
    #[serde(default)]
    pub deductions: Vec<Deduction>,
}

impl CiReport {
    pub fn assemble(inputs: CiInputs) -> Self {
        let CiInputs {
            meta,
            build,
            tests,
            lint,
            security,
            coverage,
        } = inputs;
        let mut report = Self {
            meta,
            build,
            tests: tests.normalized(),
            lint,
            security,
            coverage,
            score: 100,
            status: OverallStatus::Success,
            deductions: Vec::new(),
        };
        report.deductions = super::score::deductions(&report);
        report.score = super::score::compute_score(&report);
        report.status = super::score::overall_status(&report);
        report
    }
}
