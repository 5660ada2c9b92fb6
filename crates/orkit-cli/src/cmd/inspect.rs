use crate::output::print_json;
use anyhow::Context;
use orkit_core::{frontmatter, paths};
use std::path::Path;

/// Always JSON: the point is to see exactly what the parser produced.
pub fn run(root: &Path, file: &Path) -> anyhow::Result<()> {
    let path = if file.exists() {
        file.to_path_buf()
    } else {
        paths::resolve(root, file)
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc = frontmatter::parse(&content);

    let value = serde_json::json!({
        "file": path,
        "hasFrontmatter": !doc.frontmatter.is_empty(),
        "frontmatter": doc.frontmatter,
        "bodyLength": doc.body.chars().count(),
    });
    print_json(&value)
}
