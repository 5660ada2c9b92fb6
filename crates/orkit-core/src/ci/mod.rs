//! CI report: collect build/test/lint/security/coverage signals, score them
//! and render a self-contained HTML dashboard.

pub mod probe;
pub mod render;
pub mod score;
pub mod source;
pub mod types;

pub use render::{render_html, write_report};
pub use score::{compute_score, overall_status};
pub use source::EnvVars;
pub use types::{CiInputs, CiReport, OverallStatus};

use crate::config::CiConfig;
use crate::paths;
use probe::ProbeSource;
use source::{first_available, first_some, CoverageFileSource, EnvSource, Source};
use std::path::Path;
use types::{
    BuildResult, BuildStatus, CoverageResults, LintResults, ReportMeta, SecurityResults, TestResults,
};

const UNKNOWN: &str = "unknown";

/// Gather every signal. Environment values win; probes run only when
/// `run_probes` is set. Nothing here fails: missing data means defaults.
pub fn collect(root: &Path, config: &CiConfig, env: &EnvVars, run_probes: bool) -> CiInputs {
    let cmds = &config.commands;

    let build = {
        let status = EnvSource::new(env, source::BUILD_STATUS, source::parse_build_status).fetch();
        let errors = EnvSource::new(env, source::BUILD_ERRORS, source::parse_build_errors)
            .fetch()
            .unwrap_or_default();
        match status {
            Some(status) => BuildResult { status, errors },
            None if run_probes => {
                ProbeSource::new(&cmds.build, root, probe::scan_build)
                    .fetch()
                    .unwrap_or_default()
            }
            // Errors reported without a status still mean the build broke.
            None if !errors.is_empty() => BuildResult {
                status: BuildStatus::Failure,
                errors,
            },
            None => BuildResult::default(),
        }
    };

    let tests = {
        let env_src = EnvSource::new(env, source::TEST_RESULTS, source::parse_tests);
        let probe_src = ProbeSource::new(&cmds.test, root, probe::scan_tests);
        let mut chain: Vec<&dyn Source<TestResults>> = vec![&env_src];
        if run_probes {
            chain.push(&probe_src);
        }
        first_available(&chain)
    };

    let lint = {
        let env_src = EnvSource::new(env, source::LINT_RESULTS, source::parse_lint);
        let probe_src = ProbeSource::new(&cmds.lint, root, probe::scan_lint);
        let mut chain: Vec<&dyn Source<LintResults>> = vec![&env_src];
        if run_probes {
            chain.push(&probe_src);
        }
        first_available(&chain)
    };

    let security = {
        let env_src = EnvSource::new(env, source::SECURITY_RESULTS, source::parse_security);
        let probe_src = ProbeSource::new(&cmds.audit, root, probe::scan_audit);
        let mut chain: Vec<&dyn Source<SecurityResults>> = vec![&env_src];
        if run_probes {
            chain.push(&probe_src);
        }
        first_available(&chain)
    };

    let coverage = {
        let env_src = EnvSource::new(env, source::COVERAGE, source::parse_coverage);
        let file_src = CoverageFileSource {
            path: paths::resolve(root, &config.coverage_summary),
        };
        let chain: [&dyn Source<CoverageResults>; 2] = [&env_src, &file_src];
        first_some(&chain)
    };

    CiInputs {
        meta: collect_meta(root, env, run_probes),
        build,
        tests,
        lint,
        security,
        coverage,
    }
}

fn collect_meta(root: &Path, env: &EnvVars, run_probes: bool) -> ReportMeta {
    let git = |env_key: &'static str, args: &str| -> String {
        let env_src = EnvSource::new(env, env_key, source::parse_string);
        let git_src = ProbeSource::new(args, root, probe::scan_first_line);
        let mut chain: Vec<&dyn Source<String>> = vec![&env_src];
        if run_probes {
            chain.push(&git_src);
        }
        first_some(&chain).unwrap_or_else(|| UNKNOWN.to_string())
    };

    ReportMeta {
        commit: git(source::COMMIT_SHA, "git rev-parse HEAD"),
        branch: git(source::BRANCH, "git rev-parse --abbrev-ref HEAD"),
        pr_number: EnvSource::new(env, source::PR_NUMBER, source::parse_string).fetch(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Collect, score and write the report under `root`. `probes` overrides the
/// configured default when given.
pub fn generate(
    root: &Path,
    config: &CiConfig,
    env: &EnvVars,
    output: Option<&Path>,
    probes: Option<bool>,
) -> crate::error::Result<CiReport> {
    let run_probes = probes.unwrap_or(config.probes);
    let report = CiReport::assemble(collect(root, config, env, run_probes));
    let html_path = paths::resolve(root, output.unwrap_or(config.output.as_path()));
    write_report(&report, &html_path)?;
    Ok(report)
}
