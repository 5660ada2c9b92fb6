//! Best-effort subprocess fallbacks.
//!
//! A probe runs one of the project's own commands (`npm test`, `npm audit`)
//! and regex-scans its output into the same shape the environment would
//! provide. Spawn failures and unparseable output become `None`.

use super::source::{self, Source};
use super::types::{BuildResult, BuildStatus, LintResults, SecurityResults, TestResults};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tracing::debug;

const MAX_BUILD_ERRORS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProbeOutput {
    fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Run `command_line` in `cwd`. The program is resolved on `PATH` first so a
/// missing tool is reported as `None` rather than a spawn error.
pub fn run(command_line: &str, cwd: &Path) -> Option<ProbeOutput> {
    let mut parts = command_line.split_whitespace();
    let program = parts.next()?;
    let resolved = match which::which(program) {
        Ok(path) => path,
        Err(e) => {
            debug!(program, error = %e, "probe program not found");
            return None;
        }
    };

    let output = Command::new(resolved)
        .args(parts)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    match output {
        Ok(out) => Some(ProbeOutput {
            success: out.status.success(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }),
        Err(e) => {
            debug!(command = command_line, error = %e, "probe failed to run");
            None
        }
    }
}

pub struct ProbeSource<T> {
    pub command: String,
    pub cwd: PathBuf,
    pub parse: fn(&ProbeOutput) -> Option<T>,
}

impl<T> ProbeSource<T> {
    pub fn new(command: &str, cwd: &Path, parse: fn(&ProbeOutput) -> Option<T>) -> Self {
        Self {
            command: command.to_string(),
            cwd: cwd.to_path_buf(),
            parse,
        }
    }
}

impl<T> Source<T> for ProbeSource<T> {
    fn name(&self) -> String {
        format!("probe:{}", self.command)
    }

    fn fetch(&self) -> Option<T> {
        if self.command.trim().is_empty() {
            return None;
        }
        let out = run(&self.command, &self.cwd)?;
        let parsed = (self.parse)(&out);
        if parsed.is_none() {
            debug!(command = %self.command, "probe output not recognised");
        }
        parsed
    }
}

// ---------------------------------------------------------------------------
// Output scanners
// ---------------------------------------------------------------------------

fn error_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\berror\b").unwrap())
}

fn count_re(pattern: &'static str, cell: &'static OnceLock<Regex>) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

/// The last number captured by `re` in `text`, since summaries come last.
fn last_count(re: &Regex, text: &str) -> Option<u32> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .last()
}

pub fn scan_build(out: &ProbeOutput) -> Option<BuildResult> {
    if out.success {
        return Some(BuildResult {
            status: BuildStatus::Success,
            errors: Vec::new(),
        });
    }
    let errors = out
        .combined()
        .lines()
        .filter(|l| error_line_re().is_match(l))
        .map(|l| l.trim().to_string())
        .take(MAX_BUILD_ERRORS)
        .collect();
    Some(BuildResult {
        status: BuildStatus::Failure,
        errors,
    })
}

/// Recognises jest, vitest and mocha style summaries.
pub fn scan_tests(out: &ProbeOutput) -> Option<TestResults> {
    static PASSED: OnceLock<Regex> = OnceLock::new();
    static FAILED: OnceLock<Regex> = OnceLock::new();
    static SKIPPED: OnceLock<Regex> = OnceLock::new();
    static TOTAL: OnceLock<Regex> = OnceLock::new();

    let text = out.combined();
    let passed = last_count(count_re(r"(\d+) pass(?:ed|ing)\b", &PASSED), &text);
    let failed = last_count(count_re(r"(\d+) fail(?:ed|ing)\b", &FAILED), &text);
    let skipped = last_count(count_re(r"(\d+) (?:skipped|pending|todo)\b", &SKIPPED), &text);
    let total = last_count(count_re(r"(\d+) total\b", &TOTAL), &text);

    if passed.is_none() && failed.is_none() && total.is_none() {
        return None;
    }
    Some(
        TestResults {
            passed: passed.unwrap_or(0),
            failed: failed.unwrap_or(0),
            skipped: skipped.unwrap_or(0),
            total: total.unwrap_or(0),
        }
        .normalized(),
    )
}

/// eslint style `✖ 12 problems (3 errors, 9 warnings)`. A clean exit with no
/// summary means zero problems.
pub fn scan_lint(out: &ProbeOutput) -> Option<LintResults> {
    static ERRORS: OnceLock<Regex> = OnceLock::new();
    static WARNINGS: OnceLock<Regex> = OnceLock::new();

    let text = out.combined();
    let errors = last_count(count_re(r"(\d+) errors?\b", &ERRORS), &text);
    let warnings = last_count(count_re(r"(\d+) warnings?\b", &WARNINGS), &text);
    match (errors, warnings) {
        (None, None) if out.success => Some(LintResults::default()),
        (None, None) => None,
        (e, w) => Some(LintResults {
            errors: e.unwrap_or(0),
            warnings: w.unwrap_or(0),
        }),
    }
}

/// `npm audit --json` exits non-zero when it finds anything, so the exit
/// status is ignored and only the document matters.
pub fn scan_audit(out: &ProbeOutput) -> Option<SecurityResults> {
    source::parse_security(out.stdout.trim())
}

/// First line of stdout from a successful run, e.g. `git rev-parse HEAD`.
pub fn scan_first_line(out: &ProbeOutput) -> Option<String> {
    if !out.success {
        return None;
    }
    out.stdout
        .lines()
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
