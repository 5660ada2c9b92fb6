use super::types::{BuildStatus, CiReport, OverallStatus};
use serde::{Deserialize, Serialize};

const BUILD_FAILURE_POINTS: u32 = 30;
const TEST_FAILURE_POINTS: u32 = 5;
const TEST_FAILURE_CAP: u32 = 30;
const LINT_ERROR_POINTS: u32 = 2;
const LINT_ERROR_CAP: u32 = 20;
const SECURITY_CAP: u32 = 40;

/// Line coverage floor → points lost below it. Only the lowest floor
/// crossed applies.
const COVERAGE_FLOORS: &[(f64, u32)] = &[(50.0, 15), (70.0, 10), (80.0, 5)];

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Low,
}

impl Severity {
    pub fn points(self) -> u32 {
        match self {
            Severity::Critical => 20,
            Severity::High => 10,
            Severity::Moderate => 5,
            Severity::Low => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Deduction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Build,
    Tests,
    Lint,
    Security,
    Coverage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub area: Area,
    pub points: u32,
    pub description: String,
}

/// Itemised deductions, already capped per area.
pub fn deductions(report: &CiReport) -> Vec<Deduction> {
    let mut out = Vec::new();

    if report.build.status == BuildStatus::Failure {
        out.push(Deduction {
            area: Area::Build,
            points: BUILD_FAILURE_POINTS,
            description: "build failed".to_string(),
        });
    }

    let failed = report.tests.failed;
    if failed > 0 {
        out.push(Deduction {
            area: Area::Tests,
            points: (failed.saturating_mul(TEST_FAILURE_POINTS)).min(TEST_FAILURE_CAP),
            description: format!("{failed} failing test(s)"),
        });
    }

    let lint_errors = report.lint.errors;
    if lint_errors > 0 {
        out.push(Deduction {
            area: Area::Lint,
            points: (lint_errors.saturating_mul(LINT_ERROR_POINTS)).min(LINT_ERROR_CAP),
            description: format!("{lint_errors} lint error(s)"),
        });
    }

    let sec = &report.security;
    let security_points = [
        (sec.critical, Severity::Critical),
        (sec.high, Severity::High),
        (sec.moderate, Severity::Moderate),
        (sec.low, Severity::Low),
    ]
    .iter()
    .map(|(n, sev)| n.saturating_mul(sev.points()))
    .fold(0u32, u32::saturating_add);
    if security_points > 0 {
        out.push(Deduction {
            area: Area::Security,
            points: security_points.min(SECURITY_CAP),
            description: format!("{} security finding(s)", sec.total()),
        });
    }

    if let Some(cov) = &report.coverage {
        if let Some(&(floor, points)) = COVERAGE_FLOORS.iter().find(|(floor, _)| cov.lines < *floor) {
            out.push(Deduction {
                area: Area::Coverage,
                points,
                description: format!("line coverage {:.1}% below {floor}%", cov.lines),
            });
        }
    }

    out
}

/// 100 minus every deduction, clamped to 0..=100.
pub fn compute_score(report: &CiReport) -> u32 {
    let lost = deductions(report)
        .iter()
        .map(|d| d.points)
        .fold(0u32, u32::saturating_add);
    100u32.saturating_sub(lost)
}

/// First matching rule wins: build failure or a critical finding fails; a
/// lint error or high finding warns. Failed tests only cost score.
pub fn overall_status(report: &CiReport) -> OverallStatus {
    if report.build.status == BuildStatus::Failure
        || report.security.critical > 0
    {
        OverallStatus::Failure
    } else if report.lint.errors > 0 || report.security.high > 0 {
        OverallStatus::Warning
    } else {
        OverallStatus::Success
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
