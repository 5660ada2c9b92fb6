//! Optional data sources for the CI report.
//!
//! Every signal is read through a [`Source`]: structured environment input
//! first, then a best-effort fallback. A source that cannot produce a value
//! returns `None`; it never errors.

use super::types::{
    BuildStatus, CoverageResults, LintResults, SecurityResults, TestResults,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

pub const BUILD_STATUS: &str = "CI_BUILD_STATUS";
pub const BUILD_ERRORS: &str = "CI_BUILD_ERRORS";
pub const TEST_RESULTS: &str = "CI_TEST_RESULTS";
pub const LINT_RESULTS: &str = "CI_LINT_RESULTS";
pub const SECURITY_RESULTS: &str = "CI_SECURITY_RESULTS";
pub const COVERAGE: &str = "CI_COVERAGE";
pub const COMMIT_SHA: &str = "CI_COMMIT_SHA";
pub const BRANCH: &str = "CI_BRANCH";
pub const PR_NUMBER: &str = "CI_PR_NUMBER";

pub trait Source<T> {
    fn name(&self) -> String;
    fn fetch(&self) -> Option<T>;
}

/// The first source that yields a value, else `T::default()`.
pub fn first_available<T: Default>(sources: &[&dyn Source<T>]) -> T {
    first_some(sources).unwrap_or_default()
}

pub fn first_some<T>(sources: &[&dyn Source<T>]) -> Option<T> {
    for source in sources {
        if let Some(value) = source.fetch() {
            debug!(source = %source.name(), "ci signal resolved");
            return Some(value);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Snapshot of the `CI_*` variables, taken once per run.
#[derive(Debug, Clone, Default)]
pub struct EnvVars(BTreeMap<String, String>);

impl EnvVars {
    pub fn from_process() -> Self {
        Self(
            std::env::vars()
                .filter(|(k, _)| k.starts_with("CI_"))
                .collect(),
        )
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Non-blank value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

pub struct EnvSource<'a, T> {
    pub vars: &'a EnvVars,
    pub key: &'static str,
    pub parse: fn(&str) -> Option<T>,
}

impl<'a, T> EnvSource<'a, T> {
    pub fn new(vars: &'a EnvVars, key: &'static str, parse: fn(&str) -> Option<T>) -> Self {
        Self { vars, key, parse }
    }
}

impl<T> Source<T> for EnvSource<'_, T> {
    fn name(&self) -> String {
        format!("env:{}", self.key)
    }

    fn fetch(&self) -> Option<T> {
        let raw = self.vars.get(self.key)?;
        let parsed = (self.parse)(raw);
        if parsed.is_none() {
            debug!(var = self.key, "ignoring malformed value");
        }
        parsed
    }
}

// ---------------------------------------------------------------------------
// Value parsers
// ---------------------------------------------------------------------------

pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_str(raw).ok()
}

/// A JSON string (`"abc"`) or the plain text itself.
pub fn parse_string(raw: &str) -> Option<String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::String(s)) => Some(s),
        Ok(serde_json::Value::Number(n)) => Some(n.to_string()),
        Ok(serde_json::Value::Null) => None,
        _ => Some(raw.trim().to_string()),
    }
    .filter(|s| !s.is_empty())
}

pub fn parse_build_status(raw: &str) -> Option<BuildStatus> {
    #[derive(Deserialize)]
    struct Wrapped {
        status: String,
    }
    if let Ok(w) = serde_json::from_str::<Wrapped>(raw) {
        return BuildStatus::parse(&w.status);
    }
    BuildStatus::parse(raw)
}

/// A JSON array of messages; plain text counts as one message.
pub fn parse_build_errors(raw: &str) -> Option<Vec<String>> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => Some(
            items
                .into_iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        ),
        Ok(_) => None,
        Err(_) => Some(vec![raw.trim().to_string()]),
    }
}

pub fn parse_tests(raw: &str) -> Option<TestResults> {
    parse_json::<TestResults>(raw).map(TestResults::normalized)
}

pub fn parse_lint(raw: &str) -> Option<LintResults> {
    parse_json(raw)
}

/// Direct counts, or the `npm audit --json` document.
pub fn parse_security(raw: &str) -> Option<SecurityResults> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let vulns = value
        .pointer("/metadata/vulnerabilities")
        .cloned()
        .unwrap_or(value);
    serde_json::from_value(vulns).ok()
}

/// Direct percentages, an istanbul `coverage-summary.json` document, or a
/// bare number applied to every metric.
pub fn parse_coverage(raw: &str) -> Option<CoverageResults> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    if let Some(pct) = value.as_f64() {
        return Some(CoverageResults {
            lines: pct,
            statements: pct,
            functions: pct,
            branches: pct,
        });
    }
    if let Some(total) = value.get("total") {
        let pct = |metric: &str| {
            total
                .pointer(&format!("/{metric}/pct"))
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(0.0)
        };
        return Some(CoverageResults {
            lines: pct("lines"),
            statements: pct("statements"),
            functions: pct("functions"),
            branches: pct("branches"),
        });
    }
    serde_json::from_value(value).ok()
}

// ---------------------------------------------------------------------------
// Coverage summary file
// ---------------------------------------------------------------------------

/// Reads a coverage summary left on disk by the test run.
pub struct CoverageFileSource {
    pub path: PathBuf,
}

impl Source<CoverageResults> for CoverageFileSource {
    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn fetch(&self) -> Option<CoverageResults> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        parse_coverage(&data)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixed(Option<u32>);

    impl Source<u32> for Fixed {
        fn name(&self) -> String {
            "fixed".to_string()
        }
        fn fetch(&self) -> Option<u32> {
            self.0
        }
    }

    #[test]
    fn first_available_falls_through_to_default() {
        assert_eq!(first_available::<u32>(&[&Fixed(None), &Fixed(Some(7))]), 7);
        assert_eq!(first_available::<u32>(&[&Fixed(None)]), 0);
        assert_eq!(first_available::<u32>(&[]), 0);
    }

    #[test]
    fn env_source_parses_or_falls_back() {
        let vars = EnvVars::from_pairs([
            (TEST_RESULTS, r#"{"passed": 3, "failed": 1}"#),
            (LINT_RESULTS, "not json"),
            (BRANCH, "   "),
        ]);
        let tests = EnvSource::new(&vars, TEST_RESULTS, parse_tests).fetch().unwrap();
        assert_eq!(tests.total, 4);
        assert!(EnvSource::new(&vars, LINT_RESULTS, parse_lint).fetch().is_none());
        assert!(EnvSource::new(&vars, BRANCH, parse_string).fetch().is_none());
        assert!(EnvSource::new(&vars, COVERAGE, parse_coverage).fetch().is_none());
    }

    #[test]
    fn strings_accept_json_or_plain() {
        assert_eq!(parse_string("\"main\"").as_deref(), Some("main"));
        assert_eq!(parse_string("feature/x").as_deref(), Some("feature/x"));
        assert_eq!(parse_string("42").as_deref(), Some("42"));
        assert_eq!(parse_string("null"), None);
    }

    #[test]
    fn build_inputs() {
        assert_eq!(parse_build_status("failure"), Some(BuildStatus::Failure));
        assert_eq!(parse_build_status("\"success\""), Some(BuildStatus::Success));
        assert_eq!(
            parse_build_status(r#"{"status":"failed"}"#),
            Some(BuildStatus::Failure)
        );
        assert_eq!(
            parse_build_errors(r#"["tsc: TS2322", "tsc: TS2345"]"#).unwrap().len(),
            2
        );
        assert_eq!(parse_build_errors("one error").unwrap(), vec!["one error"]);
    }

    #[test]
    fn security_accepts_npm_audit_shape() {
        let audit = r#"{"auditReportVersion":2,"metadata":{"vulnerabilities":{"info":0,"low":1,"moderate":2,"high":0,"critical":1,"total":4}}}"#;
        let sec = parse_security(audit).unwrap();
        assert_eq!((sec.critical, sec.high, sec.moderate, sec.low), (1, 0, 2, 1));
        let direct = parse_security(r#"{"high": 3}"#).unwrap();
        assert_eq!(direct.high, 3);
    }

    #[test]
    fn coverage_shapes() {
        assert_eq!(parse_coverage("72.5").unwrap().lines, 72.5);
        let istanbul = r#"{"total":{"lines":{"total":10,"covered":8,"pct":80},"branches":{"pct":50}}}"#;
        let cov = parse_coverage(istanbul).unwrap();
        assert_eq!(cov.lines, 80.0);
        assert_eq!(cov.branches, 50.0);
        assert_eq!(cov.functions, 0.0);
        assert_eq!(parse_coverage(r#"{"lines": 91}"#).unwrap().lines, 91.0);
    }

    #[test]
    fn coverage_file_source_reads_summary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coverage-summary.json");
        let missing = CoverageFileSource { path: path.clone() };
        assert!(missing.fetch().is_none());

        std::fs::write(&path, r#"{"total":{"lines":{"pct":64.2}}}"#).unwrap();
        let source = CoverageFileSource { path };
        assert_eq!(source.fetch().unwrap().lines, 64.2);
    }
}
