//! Skill and agent records: frontmatter merged with a look at the files
//! around the definition.

use crate::error::Result;
use crate::frontmatter::{self, Frontmatter};
use crate::{hooks, io, paths};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Content truncation
// ---------------------------------------------------------------------------

/// Keep at most `budget` characters. Returns the kept text and whether
/// anything was cut.
pub fn truncate_content(body: &str, budget: usize) -> (String, bool) {
    match body.char_indices().nth(budget) {
        Some((cut, _)) => (body[..cut].to_string(), true),
        None => (body.to_string(), false),
    }
}

// ---------------------------------------------------------------------------
// SkillRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub tags: Vec<String>,
    pub user_invocable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub allowed_tools: Vec<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Allow-listed subfolder → sorted file names.
    pub structure: BTreeMap<String, Vec<String>>,
    pub hook_count: usize,
    pub content: String,
    pub content_truncated: bool,
    pub plugins: Vec<String>,
    pub related_agents: Vec<String>,
}

impl SkillRecord {
    pub fn from_frontmatter(
        dir_name: &str,
        fm: &Frontmatter,
        body: &str,
        structure: BTreeMap<String, Vec<String>>,
        budget: usize,
    ) -> Self {
        let (content, content_truncated) = truncate_content(body, budget);
        Self {
            name: fm.str("name").unwrap_or(dir_name).to_string(),
            description: fm.str("description").unwrap_or_default().to_string(),
            version: fm.str("version").map(str::to_string),
            tags: fm.list("tags"),
            user_invocable: fm.bool("user-invocable").unwrap_or(false),
            context: fm.str("context").map(str::to_string),
            allowed_tools: fm.list("allowed-tools"),
            skills: fm.list("skills"),
            agent: fm.str("agent").filter(|a| !a.is_empty()).map(str::to_string),
            structure,
            hook_count: hooks::count_skill_hook_lines(fm.raw()),
            content,
            content_truncated,
            plugins: Vec::new(),
            related_agents: Vec::new(),
        }
    }

    /// Attach the computed back-references. Consumes the record so links are
    /// fixed before it is published.
    pub fn with_links(mut self, plugins: Vec<String>, related_agents: Vec<String>) -> Self {
        self.plugins = plugins;
        self.related_agents = related_agents;
        self
    }
}

/// Build the record for `<skills_dir>/<name>/SKILL.md`.
///
/// Returns `Ok(None)` when the definition file is absent so one missing skill
/// never aborts the whole run.
pub fn extract_skill(name: &str, skills_dir: &Path, budget: usize) -> Result<Option<SkillRecord>> {
    let file = paths::skill_file(skills_dir, name);
    if !file.is_file() {
        return Ok(None);
    }
    let text = io::read_text_lossy(&file)?;
    let doc = frontmatter::parse(&text);
    let structure = scan_structure(&paths::skill_dir(skills_dir, name))?;
    Ok(Some(SkillRecord::from_frontmatter(
        name,
        &doc.frontmatter,
        &doc.body,
        structure,
        budget,
    )))
}

/// Only the allow-listed subfolders are reported, and only when present.
pub fn scan_structure(skill_dir: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let mut structure = BTreeMap::new();
    for sub in paths::SKILL_SUBDIRS {
        let dir = skill_dir.join(sub);
        if dir.is_dir() {
            structure.insert(sub.to_string(), io::list_files(&dir)?);
        }
    }
    Ok(structure)
}

// ---------------------------------------------------------------------------
// AgentRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tools: Vec<String>,
    pub skills: Vec<String>,
    pub hook_count: usize,
    pub content: String,
    pub content_truncated: bool,
    pub plugins: Vec<String>,
}

impl AgentRecord {
    pub fn from_frontmatter(file_stem: &str, fm: &Frontmatter, body: &str, budget: usize) -> Self {
        let (content, content_truncated) = truncate_content(body, budget);
        let model = fm
            .str("model")
            .or_else(|| fm.str("model_preference"))
            .map(str::to_string);
        Self {
            name: fm.str("name").unwrap_or(file_stem).to_string(),
            description: fm.str("description").unwrap_or_default().to_string(),
            model,
            color: fm.str("color").map(str::to_string),
            category: fm.str("category").map(str::to_string),
            tools: fm.list("tools"),
            skills: fm.list("skills"),
            hook_count: hooks::count_agent_hooks(fm),
            content,
            content_truncated,
            plugins: Vec::new(),
        }
    }

    pub fn with_plugins(mut self, plugins: Vec<String>) -> Self {
        self.plugins = plugins;
        self
    }
}

/// Build the record for `<agents_dir>/<name>.md`, or `Ok(None)` if absent.
pub fn extract_agent(name: &str, agents_dir: &Path, budget: usize) -> Result<Option<AgentRecord>> {
    let file = paths::agent_file(agents_dir, name);
    if !file.is_file() {
        return Ok(None);
    }
    let text = io::read_text_lossy(&file)?;
    let doc = frontmatter::parse(&text);
    Ok(Some(AgentRecord::from_frontmatter(
        name,
        &doc.frontmatter,
        &doc.body,
        budget,
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        assert_eq!(truncate_content("héllo", 10), ("héllo".to_string(), false));
        assert_eq!(truncate_content("héllo", 5), ("héllo".to_string(), false));
        assert_eq!(truncate_content("héllo", 2), ("hé".to_string(), true));
        assert_eq!(truncate_content("", 0), (String::new(), false));
    }

    #[test]
    fn extracts_skill_with_structure() {
        let dir = TempDir::new().unwrap();
        let skills = dir.path();
        write(
            &skills.join("api-design/SKILL.md"),
            "---\nname: api-design\ndescription: Design APIs\ntags: [api, rest]\nuser-invocable: true\ncontext: fork\nagent: backend-architect\nallowed-tools: [Read, Grep]\n---\nBody",
        );
        write(&skills.join("api-design/references/rest.md"), "");
        write(&skills.join("api-design/references/graphql.md"), "");
        write(&skills.join("api-design/checklists/review.md"), "");
        write(&skills.join("api-design/drafts/ignored.md"), "");

        let rec = extract_skill("api-design", skills, 100).unwrap().unwrap();
        assert_eq!(rec.name, "api-design");
        assert_eq!(rec.description, "Design APIs");
        assert_eq!(rec.tags, vec!["api", "rest"]);
        assert!(rec.user_invocable);
        assert_eq!(rec.context.as_deref(), Some("fork"));
        assert_eq!(rec.agent.as_deref(), Some("backend-architect"));
        assert_eq!(rec.allowed_tools, vec!["Read", "Grep"]);
        assert_eq!(rec.structure.len(), 2);
        assert_eq!(rec.structure["references"], vec!["graphql.md", "rest.md"]);
        assert!(!rec.structure.contains_key("drafts"));
        assert_eq!(rec.content, "Body");
        assert!(!rec.content_truncated);
    }

    #[test]
    fn missing_skill_file_is_none() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("empty-skill")).unwrap();
        assert!(extract_skill("empty-skill", dir.path(), 100).unwrap().is_none());
        assert!(extract_skill("absent", dir.path(), 100).unwrap().is_none());
    }

    #[test]
    fn absent_keys_default_silently() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("bare/SKILL.md"), "no frontmatter at all");
        let rec = extract_skill("bare", dir.path(), 100).unwrap().unwrap();
        assert_eq!(rec.name, "bare");
        assert_eq!(rec.description, "");
        assert!(rec.version.is_none());
        assert!(rec.tags.is_empty());
        assert!(!rec.user_invocable);
        assert_eq!(rec.content, "no frontmatter at all");
    }

    #[test]
    fn long_body_is_flagged_truncated() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("long/SKILL.md"), &"x".repeat(50));
        let rec = extract_skill("long", dir.path(), 10).unwrap().unwrap();
        assert_eq!(rec.content.len(), 10);
        assert!(rec.content_truncated);
    }

    #[test]
    fn extracts_agent_with_legacy_model_key() {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join("debugger.md"),
            "---\ndescription: Finds bugs\nmodel_preference: sonnet\ntools: Read, Bash\nskills:\n  - root-cause\n---\nYou debug.",
        );
        let rec = extract_agent("debugger", dir.path(), 100).unwrap().unwrap();
        assert_eq!(rec.name, "debugger");
        assert_eq!(rec.model.as_deref(), Some("sonnet"));
        assert_eq!(rec.tools, vec!["Read", "Bash"]);
        assert_eq!(rec.skills, vec!["root-cause"]);
        assert_eq!(rec.hook_count, 0);
        assert!(extract_agent("nobody", dir.path(), 100).unwrap().is_none());
    }

    #[test]
    fn links_are_attached_by_builder() {
        let fm = Frontmatter::new();
        let rec = SkillRecord::from_frontmatter("x", &fm, "", BTreeMap::new(), 10)
            .with_links(vec!["ork".into()], vec!["agent-a".into()]);
        assert_eq!(rec.plugins, vec!["ork"]);
        assert_eq!(rec.related_agents, vec!["agent-a"]);

        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("userInvocable").is_some());
        assert!(json.get("contentTruncated").is_some());
        assert!(json.get("relatedAgents").is_some());
        assert!(json.get("version").is_none());
    }
}
