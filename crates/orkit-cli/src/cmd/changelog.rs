use crate::output::emit_json;
use anyhow::Context;
use orkit_core::changelog::{self, LandscapeProps, SquareProps};
use orkit_core::config::Config;
use orkit_core::paths;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Landscape,
    Square,
}

pub fn run(
    root: &Path,
    version: Option<&str>,
    format: Format,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let path = paths::resolve(root, &config.changelog.path);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let release = changelog::parse(&text, version)?;
    let output = output.map(|p| paths::resolve(root, p));

    match format {
        Format::Landscape => {
            let props =
                LandscapeProps::from_release(&release, config.changelog.landscape_highlights);
            emit_json(&props, output.as_deref())
        }
        Format::Square => {
            let props = SquareProps::from_release(&release, config.changelog.square_highlights);
            emit_json(&props, output.as_deref())
        }
    }
}
