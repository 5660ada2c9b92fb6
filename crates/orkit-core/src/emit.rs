use crate::aggregate::AggregatedOutput;
use crate::config::{EmitFormat, OutputTarget};
use crate::error::Result;
use crate::{io, paths};
use std::path::{Path, PathBuf};
use tracing::info;

const BANNER: &str = "// Generated by `orkit aggregate`. Do not edit by hand.";

/// Render the aggregated data as a module or plain JSON document.
pub fn emit(output: &AggregatedOutput, format: EmitFormat) -> Result<String> {
    let json = serde_json::to_string_pretty(output)?;
    let text = match format {
        EmitFormat::Typescript => format!(
            "{BANNER}\n\nexport const pluginData = {json} as const;\n\nexport type PluginData = typeof pluginData;\n\nexport default pluginData;\n"
        ),
        EmitFormat::Script => format!("{BANNER}\n\nwindow.ORCHESTKIT_DATA = {json};\n"),
        EmitFormat::Json => format!("{json}\n"),
    };
    Ok(text)
}

/// Render and atomically overwrite every target. Relative paths resolve
/// against `root`. Returns the written paths in target order.
pub fn write_outputs(
    root: &Path,
    output: &AggregatedOutput,
    targets: &[OutputTarget],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(targets.len());
    for target in targets {
        let path = paths::resolve(root, &target.path);
        let text = emit(output, target.format)?;
        io::atomic_write(&path, text.as_bytes())?;
        info!(path = %path.display(), format = target.format.as_str(), "wrote aggregate output");
        written.push(path);
    }
    Ok(written)
}
