use crate::output::print_json;
use anyhow::Context;
use orkit_core::ci::{self, EnvVars, OverallStatus};
use orkit_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, output: Option<&Path>, no_probe: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let env = EnvVars::from_process();
    let probes = if no_probe { Some(false) } else { None };

    let report = ci::generate(root, &config.ci, &env, output, probes)
        .context("failed to generate CI report")?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "CI status: {} (score {}/100)",
            report.status.as_str(),
            report.score
        );
        for d in &report.deductions {
            println!("  -{:<3} {}", d.points, d.description);
        }
    }

    if report.status == OverallStatus::Failure {
        anyhow::bail!("CI status is failure (score {})", report.score);
    }
    Ok(())
}
