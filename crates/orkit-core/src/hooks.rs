use crate::error::{OrkitError, Result};
use crate::frontmatter::Frontmatter;
use crate::metadata::{AgentRecord, SkillRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

const RUNNER: &str = "run-hook.mjs ";
const SILENT_RUNNER: &str = "run-hook-silent.mjs ";

// ---------------------------------------------------------------------------
// hooks.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookCommand {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookMatcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(default)]
    pub hooks: Vec<HookCommand>,
}

/// Global hook registrations keyed by lifecycle event name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HooksFile {
    #[serde(default)]
    pub hooks: BTreeMap<String, Vec<HookMatcher>>,
}

impl HooksFile {
    /// A missing file means no global hooks. A file that exists but does not
    /// parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            warn!(path = %path.display(), "hooks file not found; counting zero global hooks");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|source| OrkitError::HooksSyntax {
            path: path.display().to_string(),
            source,
        })
    }

    /// Number of hook commands under each event.
    pub fn counts_by_event(&self) -> BTreeMap<String, usize> {
        self.hooks
            .iter()
            .map(|(event, matchers)| {
                (event.clone(), matchers.iter().map(|m| m.hooks.len()).sum())
            })
            .collect()
    }

    pub fn entries(&self) -> Vec<HookEntry> {
        let mut out = Vec::new();
        for (event, matchers) in &self.hooks {
            for m in matchers {
                for h in &m.hooks {
                    let (path, name) = hook_path_and_name(&h.command);
                    out.push(HookEntry {
                        event: event.clone(),
                        matcher: m.matcher.clone().unwrap_or_else(|| "*".to_string()),
                        scope: HookScope::from_path(&path),
                        fire_and_forget: h.command.contains(SILENT_RUNNER.trim_end()),
                        name,
                        path,
                    });
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HookScope {
    Global,
    Agent,
    Skill,
}

impl HookScope {
    pub fn from_path(hook_path: &str) -> Self {
        if hook_path.starts_with("agent/") {
            HookScope::Agent
        } else if hook_path.starts_with("skill/") {
            HookScope::Skill
        } else {
            HookScope::Global
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HookScope::Global => "global",
            HookScope::Agent => "agent",
            HookScope::Skill => "skill",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookEntry {
    pub event: String,
    pub matcher: String,
    pub name: String,
    pub path: String,
    pub scope: HookScope,
    pub fire_and_forget: bool,
}

/// `(path, short name)` for a hook command. Runner commands yield the script
/// path argument, anything else falls back to the last path segment.
pub fn hook_path_and_name(command: &str) -> (String, String) {
    for runner in [RUNNER, SILENT_RUNNER] {
        if let Some((_, rest)) = command.split_once(runner) {
            let path = rest.trim().to_string();
            let name = path.rsplit('/').next().unwrap_or_default().to_string();
            return (path, name);
        }
    }
    let name = command.rsplit('/').next().unwrap_or_default().to_string();
    (name.clone(), name)
}

/// `PreToolUse` → `pre-tool-use`.
pub fn event_slug(event: &str) -> String {
    let mut slug = String::with_capacity(event.len() + 4);
    for (i, c) in event.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
        } else {
            slug.push(c);
        }
    }
    slug
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookCounts {
    pub global: usize,
    pub scoped: usize,
    pub total: usize,
    pub by_event: BTreeMap<String, usize>,
}

fn command_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(?:-\s+)?command:\s*\S").unwrap())
}

/// Hook-invocation lines (`command: ...`) anywhere in a skill's frontmatter.
pub fn count_skill_hook_lines(raw_frontmatter: &str) -> usize {
    command_line_re().find_iter(raw_frontmatter).count()
}

/// Commands registered in an agent's nested `hooks:` block.
pub fn count_agent_hooks(fm: &Frontmatter) -> usize {
    fm.raw_block("hooks")
        .map(|block| command_line_re().find_iter(&block).count())
        .unwrap_or(0)
}

/// Sum global and scoped registrations. Pure counting: no dedup and no
/// validation of the referenced scripts.
pub fn count_hooks(file: &HooksFile, agents: &[AgentRecord], skills: &[SkillRecord]) -> HookCounts {
    let by_event = file.counts_by_event();
    let global: usize = by_event.values().sum();
    let scoped = agents.iter().map(|a| a.hook_count).sum::<usize>()
        + skills.iter().map(|s| s.hook_count).sum::<usize>();
    HookCounts {
        global,
        scoped,
        total: global + scoped,
        by_event,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
