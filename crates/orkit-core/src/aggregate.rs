//! Join manifest membership with the scanned corpus into the data model the
//! docs site consumes.

use crate::config::{AggregateConfig, Config};
use crate::error::Result;
use crate::hooks::{self, HookCounts, HooksFile};
use crate::manifest::Manifest;
use crate::metadata::{self, AgentRecord, SkillRecord};
use crate::{io, paths};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

pub const OTHER_CATEGORY: &str = "other";

// ---------------------------------------------------------------------------
// Corpus
// ---------------------------------------------------------------------------

/// Everything read from disk for one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub skills: Vec<SkillRecord>,
    pub agents: Vec<AgentRecord>,
    pub manifests: Vec<Manifest>,
    pub hooks: HooksFile,
}

impl Corpus {
    pub fn load(root: &Path, config: &Config) -> Result<Self> {
        let sources = &config.sources;
        let budget = config.aggregate.content_budget;

        let skills_dir = paths::resolve(root, &sources.skills_dir);
        let mut skills = Vec::new();
        for name in io::list_dirs(&skills_dir)? {
            match metadata::extract_skill(&name, &skills_dir, budget)? {
                Some(rec) => skills.push(rec),
                None => warn!(skill = %name, "no {} found; skipping", paths::SKILL_FILE),
            }
        }

        let agents_dir = paths::resolve(root, &sources.agents_dir);
        let mut agents = Vec::new();
        for file in io::list_files_with_ext(&agents_dir, "md")? {
            let Some(stem) = Path::new(&file).file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match metadata::extract_agent(stem, &agents_dir, budget)? {
                Some(rec) => agents.push(rec),
                None => warn!(agent = %stem, "agent file vanished during scan; skipping"),
            }
        }

        let manifests = Manifest::list(&paths::resolve(root, &sources.manifests_dir))?;
        let hooks = HooksFile::load(&paths::resolve(root, &sources.hooks_file))?;

        debug!(
            skills = skills.len(),
            agents = agents.len(),
            manifests = manifests.len(),
            "corpus loaded"
        );
        Ok(Self {
            skills,
            agents,
            manifests,
            hooks,
        })
    }

    fn skill_names(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.name.clone()).collect()
    }

    fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Output model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub plugins: usize,
    pub skills: usize,
    pub agents: usize,
    pub hooks: usize,
    /// User-invocable skills.
    pub commands: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    pub skill_count: usize,
    pub agent_count: usize,
    /// First `sample_size` member skills.
    pub skills: Vec<String>,
    pub agents: Vec<String>,
    pub skills_summary: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedOutput {
    pub totals: Totals,
    pub plugins: Vec<PluginSummary>,
    pub agents: Vec<AgentRecord>,
    /// Category → number of published skills in it.
    pub categories: BTreeMap<String, usize>,
    pub skills_summary: BTreeMap<String, Vec<String>>,
    pub skills_detailed: Vec<SkillRecord>,
    pub hooks: HookCounts,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Every category with a keyword that occurs (case-insensitively) in the
/// name or one of the tags. Unmatched skills land in `other`.
pub fn categorize(
    name: &str,
    tags: &[String],
    categories: &BTreeMap<String, Vec<String>>,
) -> Vec<String> {
    let haystacks: Vec<String> = std::iter::once(name)
        .chain(tags.iter().map(String::as_str))
        .map(str::to_lowercase)
        .collect();

    let matched: Vec<String> = categories
        .iter()
        .filter(|(_, keywords)| {
            keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .any(|k| haystacks.iter().any(|h| h.contains(&k)))
        })
        .map(|(cat, _)| cat.clone())
        .collect();

    if matched.is_empty() {
        vec![OTHER_CATEGORY.to_string()]
    } else {
        matched
    }
}

fn summarize<'a>(
    skills: impl IntoIterator<Item = &'a SkillRecord>,
    categories: &BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, Vec<String>> {
    let mut summary: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for skill in skills {
        for cat in categorize(&skill.name, &skill.tags, categories) {
            summary.entry(cat).or_default().push(skill.name.clone());
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

pub fn aggregate(corpus: &Corpus, config: &AggregateConfig) -> AggregatedOutput {
    let all_skills = corpus.skill_names();
    let all_agents = corpus.agent_names();
    let skill_idx: BTreeMap<&str, &SkillRecord> =
        corpus.skills.iter().map(|s| (s.name.as_str(), s)).collect();
    let known_agents: HashSet<&str> = all_agents.iter().map(String::as_str).collect();

    // Record name → plugins that bundle it.
    let mut skill_plugins: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut agent_plugins: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut plugins = Vec::with_capacity(corpus.manifests.len());

    for manifest in &corpus.manifests {
        let skills = manifest.skill_names(&all_skills);
        let agents = manifest.agent_names(&all_agents);

        for name in &skills {
            if !skill_idx.contains_key(name.as_str()) {
                warn!(plugin = %manifest.name, skill = %name, "manifest lists unknown skill");
            }
            skill_plugins
                .entry(name.clone())
                .or_default()
                .push(manifest.name.clone());
        }
        for name in &agents {
            if !known_agents.contains(name.as_str()) {
                warn!(plugin = %manifest.name, agent = %name, "manifest lists unknown agent");
            }
            agent_plugins
                .entry(name.clone())
                .or_default()
                .push(manifest.name.clone());
        }

        let members = skills.iter().filter_map(|n| skill_idx.get(n.as_str()).copied());
        plugins.push(PluginSummary {
            name: manifest.name.clone(),
            description: manifest.description.clone(),
            version: manifest.version.clone(),
            skill_count: skills.len(),
            agent_count: agents.len(),
            skills_summary: summarize(members, &config.categories),
            skills: skills.iter().take(config.sample_size).cloned().collect(),
            agents: agents.iter().take(config.sample_size).cloned().collect(),
        });
    }

    let publish_all = corpus.manifests.is_empty();

    // Agent name → skills it declares, plus the skill's own `agent` field.
    let mut related: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for agent in &corpus.agents {
        for skill in &agent.skills {
            related.entry(skill.as_str()).or_default().push(agent.name.clone());
        }
    }

    let skills_detailed: Vec<SkillRecord> = corpus
        .skills
        .iter()
        .filter(|s| publish_all || skill_plugins.contains_key(&s.name))
        .map(|s| {
            let mut agents = related.get(s.name.as_str()).cloned().unwrap_or_default();
            if let Some(agent) = &s.agent {
                if known_agents.contains(agent.as_str()) && !agents.contains(agent) {
                    agents.push(agent.clone());
                }
            }
            let plugins = skill_plugins.get(&s.name).cloned().unwrap_or_default();
            s.clone().with_links(plugins, agents)
        })
        .collect();

    let agents: Vec<AgentRecord> = corpus
        .agents
        .iter()
        .filter(|a| publish_all || agent_plugins.contains_key(&a.name))
        .map(|a| {
            let plugins = agent_plugins.get(&a.name).cloned().unwrap_or_default();
            a.clone().with_plugins(plugins)
        })
        .collect();

    let skills_summary = summarize(&skills_detailed, &config.categories);
    let categories = skills_summary
        .iter()
        .map(|(cat, names)| (cat.clone(), names.len()))
        .collect();
    let hook_counts = hooks::count_hooks(&corpus.hooks, &agents, &skills_detailed);

    AggregatedOutput {
        totals: Totals {
            plugins: plugins.len(),
            skills: skills_detailed.len(),
            agents: agents.len(),
            hooks: hook_counts.total,
            commands: skills_detailed.iter().filter(|s| s.user_invocable).count(),
        },
        plugins,
        agents,
        categories,
        skills_summary,
        skills_detailed,
        hooks: hook_counts,
    }
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

    fn skill_md(name: &str, tags: &str, invocable: bool) -> String {
        format!(
            "---\nname: {name}\ndescription: {name} skill\ntags: [{tags}]\nuser-invocable: {invocable}\n---\n# {name}\n"
        )
    }

    /// Five skills, two agents, two manifests: one `"all"`, one explicit pair.
    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for (name, tags, inv) in [
            ("api-design", "api, rest", false),
            ("react-patterns", "react", false),
            ("unit-testing", "pytest", true),
            ("commit", "git", true),
            ("owasp-top-10", "security", false),
        ] {
            write(&root.join(format!("src/skills/{name}/SKILL.md")), &skill_md(name, tags, inv));
        }
        write(
            &root.join("src/agents/backend-architect.md"),
            "---\nname: backend-architect\ndescription: APIs\nskills: [api-design]\nhooks:\n  - command: node run-hook.mjs agent/guard\n---\nbody",
        );
        write(
            &root.join("src/agents/test-generator.md"),
            "---\nname: test-generator\ndescription: Tests\nskills: [unit-testing]\n---\nbody",
        );
        write(
            &root.join("manifests/core.json"),
            r#"{"name":"ork","version":"6.0.2","skills":"all","agents":"all"}"#,
        );
        write(
            &root.join("manifests/lite.json"),
            r#"{"name":"ork-lite","version":"6.0.2","skills":["api-design","commit"],"agents":["backend-architect"]}"#,
        );
        write(
            &root.join("src/hooks/hooks.json"),
            r#"{"hooks":{"Stop":[{"hooks":[{"type":"command","command":"node run-hook.mjs stop/save"}]}]}}"#,
        );
        dir
    }

    fn run(dir: &TempDir) -> AggregatedOutput {
        let cfg = Config::default();
        let corpus = Corpus::load(dir.path(), &cfg).unwrap();
        aggregate(&corpus, &cfg.aggregate)
    }

    #[test]
    fn totals_are_deduplicated_across_plugins() {
        let dir = fixture();
        let out = run(&dir);

        assert_eq!(out.totals.plugins, 2);
        assert_eq!(out.totals.skills, 5);
        assert_eq!(out.totals.skills, out.skills_detailed.len());
        assert_eq!(out.totals.agents, 2);
        assert_eq!(out.totals.agents, out.agents.len());
        assert_eq!(out.totals.commands, 2);

        // Manifests load sorted by file name.
        let counts: Vec<(&str, usize)> = out
            .plugins
            .iter()
            .map(|p| (p.name.as_str(), p.skill_count))
            .collect();
        assert_eq!(counts, vec![("ork", 5), ("ork-lite", 2)]);
    }

    #[test]
    fn records_carry_back_references() {
        let dir = fixture();
        let out = run(&dir);

        let api = out.skills_detailed.iter().find(|s| s.name == "api-design").unwrap();
        assert_eq!(api.plugins, vec!["ork", "ork-lite"]);
        assert_eq!(api.related_agents, vec!["backend-architect"]);

        let react = out.skills_detailed.iter().find(|s| s.name == "react-patterns").unwrap();
        assert_eq!(react.plugins, vec!["ork"]);
        assert!(react.related_agents.is_empty());

        let tester = out.agents.iter().find(|a| a.name == "test-generator").unwrap();
        assert_eq!(tester.plugins, vec!["ork"]);
    }

    #[test]
    fn hooks_include_global_and_scoped() {
        let dir = fixture();
        let out = run(&dir);
        assert_eq!(out.hooks.global, 1);
        assert_eq!(out.hooks.scoped, 1);
        assert_eq!(out.totals.hooks, 2);
    }

    #[test]
    fn categories_match_names_and_tags() {
        let dir = fixture();
        let out = run(&dir);
        assert_eq!(out.skills_summary["backend"], vec!["api-design"]);
        assert_eq!(out.skills_summary["frontend"], vec!["react-patterns"]);
        assert_eq!(out.skills_summary["testing"], vec!["unit-testing"]);
        assert_eq!(out.skills_summary["security"], vec!["owasp-top-10"]);
        assert_eq!(out.skills_summary["workflow"], vec!["commit"]);
        assert_eq!(out.categories["backend"], 1);

        let lite = &out.plugins[1];
        assert_eq!(lite.skills_summary.len(), 2);
        assert!(lite.skills_summary.contains_key("workflow"));
    }

    #[test]
    fn unmatched_skill_goes_to_other() {
        let cats = BTreeMap::from([("backend".to_string(), vec!["api".to_string()])]);
        assert_eq!(categorize("quantum-thing", &[], &cats), vec![OTHER_CATEGORY]);
        assert_eq!(
            categorize("Thing", &["REST-API".to_string()], &cats),
            vec!["backend"]
        );
    }

    #[test]
    fn unpublished_skills_are_excluded() {
        let dir = fixture();
        std::fs::remove_file(dir.path().join("manifests/core.json")).unwrap();
        let out = run(&dir);
        let names: Vec<&str> = out.skills_detailed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["api-design", "commit"]);
        assert_eq!(out.totals.skills, 2);
        assert_eq!(out.totals.agents, 1);
    }

    #[test]
    fn no_manifests_publishes_whole_corpus() {
        let dir = fixture();
        std::fs::remove_dir_all(dir.path().join("manifests")).unwrap();
        let out = run(&dir);
        assert_eq!(out.totals.plugins, 0);
        assert_eq!(out.totals.skills, 5);
        assert_eq!(out.totals.agents, 2);
        assert!(out.skills_detailed.iter().all(|s| s.plugins.is_empty()));
    }

    #[test]
    fn dangling_names_count_but_do_not_publish() {
        let dir = fixture();
        write(
            &dir.path().join("manifests/lite.json"),
            r#"{"name":"ork-lite","skills":["api-design","ghost"]}"#,
        );
        let out = run(&dir);
        let lite = out.plugins.iter().find(|p| p.name == "ork-lite").unwrap();
        assert_eq!(lite.skill_count, 2);
        assert_eq!(lite.skills, vec!["api-design", "ghost"]);
        assert!(out.skills_detailed.iter().all(|s| s.name != "ghost"));
    }

    #[test]
    fn skill_dir_without_definition_is_skipped() {
        let dir = fixture();
        std::fs::create_dir_all(dir.path().join("src/skills/half-done/references")).unwrap();
        let corpus = Corpus::load(dir.path(), &Config::default()).unwrap();
        assert_eq!(corpus.skills.len(), 5);
    }

    #[test]
    fn invalid_utf8_definitions_still_load() {
        let dir = fixture();
        let skill = dir.path().join("src/skills/latin1-notes/SKILL.md");
        std::fs::create_dir_all(skill.parent().unwrap()).unwrap();
        std::fs::write(&skill, b"---\nname: latin1-notes\ndescription: caf\xe9 notes\n---\n\xff\xfe body\n").unwrap();
        std::fs::write(
            dir.path().join("src/agents/broken-bytes.md"),
            b"---\nname: broken-bytes\ndescription: ok\n---\n\xc3\x28\n",
        )
        .unwrap();

        let corpus = Corpus::load(dir.path(), &Config::default()).unwrap();
        assert_eq!(corpus.skills.len(), 6);
        assert_eq!(corpus.agents.len(), 3);
        let notes = corpus.skills.iter().find(|s| s.name == "latin1-notes").unwrap();
        assert_eq!(notes.description, "caf\u{fffd} notes");
    }

    #[test]
    fn sample_size_limits_plugin_lists() {
        let dir = fixture();
        let mut cfg = Config::default();
        cfg.aggregate.sample_size = 2;
        let corpus = Corpus::load(dir.path(), &cfg).unwrap();
        let out = aggregate(&corpus, &cfg.aggregate);
        assert_eq!(out.plugins[0].skills.len(), 2);
        assert_eq!(out.plugins[0].skill_count, 5);
    }
}
