//! Rewrite agent frontmatter into the current field layout.
//!
//! `model_preference` becomes `model`, `max_tokens` goes away, comma-separated
//! `tools` / `skills` become block lists and the nested `hooks:` block is
//! carried over untouched.

use crate::error::Result;
use crate::frontmatter::{self, Frontmatter, Value};
use crate::{io, paths};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

const DEFAULT_MODEL: &str = "inherit";
const DEFAULT_COLOR: &str = "blue";
const DROPPED_KEYS: &[&str] = &["max_tokens", "model_preference"];
const LEADING_KEYS: &[&str] = &["name", "description", "model", "color", "tools", "skills", "hooks"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrateOutcome {
    Migrated {
        name: String,
        model: String,
        tools: usize,
        skills: usize,
    },
    /// Already in the current layout.
    Unchanged,
    /// No frontmatter to migrate.
    Skipped,
}

/// Produce the migrated file text, or `None` when there is no frontmatter.
pub fn migrate_text(content: &str) -> Option<String> {
    let doc = frontmatter::parse(content);
    if doc.frontmatter.is_empty() {
        return None;
    }
    let old = &doc.frontmatter;
    let hooks = old.raw_block("hooks");

    let mut fm = Frontmatter::new();
    fm.insert("name", Value::Str(old.str("name").unwrap_or_default().to_string()));
    fm.insert(
        "description",
        Value::Str(old.str("description").unwrap_or_default().to_string()),
    );
    let model = old
        .str("model_preference")
        .or_else(|| old.str("model"))
        .unwrap_or(DEFAULT_MODEL);
    fm.insert("model", Value::Str(model.to_string()));
    fm.insert(
        "color",
        Value::Str(old.str("color").unwrap_or(DEFAULT_COLOR).to_string()),
    );
    for key in ["tools", "skills"] {
        let items = old.list(key);
        if !items.is_empty() {
            fm.insert(key, Value::List(items));
        }
    }
    for (key, value) in old.iter() {
        if !LEADING_KEYS.contains(&key) && !DROPPED_KEYS.contains(&key) {
            fm.insert(key, value.clone());
        }
    }

    let mut out = frontmatter::render(&fm, hooks.as_deref());
    out.push_str(doc.body.trim_start_matches('\n'));
    Some(out)
}

pub fn migrate_agent(path: &Path) -> Result<MigrateOutcome> {
    let content = std::fs::read_to_string(path)?;
    let Some(migrated) = migrate_text(&content) else {
        return Ok(MigrateOutcome::Skipped);
    };
    if migrated == content {
        return Ok(MigrateOutcome::Unchanged);
    }
    io::atomic_write(path, migrated.as_bytes())?;

    let doc = frontmatter::parse(&migrated);
    let fm = &doc.frontmatter;
    let name = fm.str("name").unwrap_or_default().to_string();
    if paths::validate_name(&name).is_err() {
        warn!(file = %path.display(), name = %name, "agent name is not a kebab-case slug");
    }
    Ok(MigrateOutcome::Migrated {
        model: fm.str("model").unwrap_or(DEFAULT_MODEL).to_string(),
        tools: fm.list("tools").len(),
        skills: fm.list("skills").len(),
        name,
    })
}

/// Migrate every `*.md` in `dir`, sorted. A missing directory is an error.
pub fn migrate_dir(dir: &Path) -> Result<Vec<(String, MigrateOutcome)>> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("directory not found: {}", dir.display()),
        )
        .into());
    }
    let mut results = Vec::new();
    for file in io::list_files_with_ext(dir, "md")? {
        let outcome = migrate_agent(&dir.join(&file))?;
        info!(file = %file, ?outcome, "agent migration");
        results.push((file, outcome));
    }
    Ok(results)
}
