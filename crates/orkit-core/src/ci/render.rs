use super::types::{BuildStatus, CiReport};
use crate::error::{OrkitError, Result};
use crate::{io, paths};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

const REPORT_TEMPLATE: &str = include_str!("../../templates/ci-report.html.hbs");

#[derive(Debug, Serialize)]
struct Card {
    title: &'static str,
    ok: bool,
    lines: Vec<String>,
}

#[derive(Debug, Serialize)]
struct View<'a> {
    #[serde(flatten)]
    report: &'a CiReport,
    status_label: &'static str,
    commit_short: String,
    cards: Vec<Card>,
    build_errors: &'a [String],
    data_json: String,
}

fn cards(report: &CiReport) -> Vec<Card> {
    let t = &report.tests;
    let l = &report.lint;
    let s = &report.security;
    let mut cards = vec![
        Card {
            title: "Build",
            ok: report.build.status != BuildStatus::Failure,
            lines: vec![format!("Status: {}", report.build.status.as_str())],
        },
        Card {
            title: "Tests",
            ok: t.failed == 0,
            lines: vec![
                format!("{} passed / {} total", t.passed, t.total),
                format!("{} failed, {} skipped", t.failed, t.skipped),
            ],
        },
        Card {
            title: "Lint",
            ok: l.errors == 0,
            lines: vec![format!("{} errors, {} warnings", l.errors, l.warnings)],
        },
        Card {
            title: "Security",
            ok: s.critical == 0 && s.high == 0,
            lines: vec![format!(
                "{} critical, {} high, {} moderate, {} low",
                s.critical, s.high, s.moderate, s.low
            )],
        },
    ];
    if let Some(c) = &report.coverage {
        cards.push(Card {
            title: "Coverage",
            ok: c.lines >= 80.0,
            lines: vec![
                format!("Lines {:.1}%, statements {:.1}%", c.lines, c.statements),
                format!("Functions {:.1}%, branches {:.1}%", c.functions, c.branches),
            ],
        });
    }
    cards
}

/// JSON safe to embed inside a `<script>` element.
fn embeddable_json(report: &CiReport) -> Result<String> {
    Ok(serde_json::to_string(report)?.replace("</", "<\\/"))
}

pub fn render_html(report: &CiReport) -> Result<String> {
    let mut hb = Handlebars::new();
    hb.register_template_string("ci-report", REPORT_TEMPLATE)
        .map_err(|e| OrkitError::Template(e.to_string()))?;

    let view = View {
        report,
        status_label: report.status.as_str(),
        commit_short: report.meta.commit.chars().take(7).collect(),
        cards: cards(report),
        build_errors: &report.build.errors,
        data_json: embeddable_json(report)?,
    };
    hb.render("ci-report", &view)
        .map_err(|e| OrkitError::Template(e.to_string()))
}

/// Write the HTML page and its sibling `.json` data file.
pub fn write_report(report: &CiReport, html_path: &Path) -> Result<(PathBuf, PathBuf)> {
    let html = render_html(report)?;
    io::atomic_write(html_path, html.as_bytes())?;

    let json_path = paths::sibling_json(html_path);
    let json = serde_json::to_string_pretty(report)?;
    io::atomic_write(&json_path, json.as_bytes())?;

    info!(
        html = %html_path.display(),
        json = %json_path.display(),
        status = report.status.as_str(),
        score = report.score,
        "wrote ci report"
    );
    Ok((html_path.to_path_buf(), json_path))
}
