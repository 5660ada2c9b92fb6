use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SourcesConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_skills_dir")]
    pub skills_dir: PathBuf,
    #[serde(default = "default_agents_dir")]
    pub agents_dir: PathBuf,
    #[serde(default = "default_hooks_file")]
    pub hooks_file: PathBuf,
    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: PathBuf,
}

fn default_skills_dir() -> PathBuf {
    PathBuf::from(paths::SKILLS_DIR)
}

fn default_agents_dir() -> PathBuf {
    PathBuf::from(paths::AGENTS_DIR)
}

fn default_hooks_file() -> PathBuf {
    PathBuf::from(paths::HOOKS_FILE)
}

fn default_manifests_dir() -> PathBuf {
    PathBuf::from(paths::MANIFESTS_DIR)
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            skills_dir: default_skills_dir(),
            agents_dir: default_agents_dir(),
            hooks_file: default_hooks_file(),
            manifests_dir: default_manifests_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// AggregateConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitFormat {
    /// `export const pluginData = {...} as const;`
    Typescript,
    /// `window.ORCHESTKIT_DATA = {...};` for the static docs site.
    Script,
    Json,
}

impl EmitFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            EmitFormat::Typescript => "typescript",
            EmitFormat::Script => "script",
            EmitFormat::Json => "json",
        }
    }

    /// Guess from a file extension; `.ts` → typescript, `.js` → script.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ts" | "mts" => Some(EmitFormat::Typescript),
            "js" | "mjs" => Some(EmitFormat::Script),
            "json" => Some(EmitFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub format: EmitFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Body characters kept per record before truncation.
    #[serde(default = "default_content_budget")]
    pub content_budget: usize,
    /// Names listed in each plugin's `skills` / `agents` sample.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_outputs")]
    pub outputs: Vec<OutputTarget>,
    /// Category → keywords matched against skill names and tags.
    #[serde(default = "default_categories")]
    pub categories: BTreeMap<String, Vec<String>>,
}

fn default_content_budget() -> usize {
    3000
}

fn default_sample_size() -> usize {
    8
}

fn default_outputs() -> Vec<OutputTarget> {
    vec![
        OutputTarget {
            path: PathBuf::from(paths::GENERATED_DIR).join("plugin-data.ts"),
            format: EmitFormat::Typescript,
        },
        OutputTarget {
            path: PathBuf::from(paths::GENERATED_DIR).join("plugin-data.js"),
            format: EmitFormat::Script,
        },
    ]
}

fn default_categories() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        ("ai-llm", &["llm", "rag", "embedding", "prompt", "langgraph", "agent-loop", "memory"]),
        ("backend", &["api", "backend", "database", "sql", "postgres", "fastapi", "cache"]),
        ("frontend", &["react", "frontend", "design-system", "css", "component", "accessibility"]),
        ("testing", &["test", "e2e", "coverage", "mock"]),
        ("security", &["security", "auth", "owasp", "secret"]),
        ("devops", &["ci-cd", "deploy", "docker", "kubernetes", "release", "observability"]),
        ("workflow", &["commit", "git", "review", "plan", "brainstorm", "assess"]),
    ];
    table
        .iter()
        .map(|(cat, kws)| (cat.to_string(), kws.iter().map(|k| k.to_string()).collect()))
        .collect()
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            content_budget: default_content_budget(),
            sample_size: default_sample_size(),
            outputs: default_outputs(),
            categories: default_categories(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChangelogConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    #[serde(default = "default_changelog_path")]
    pub path: PathBuf,
    #[serde(default = "default_landscape_highlights")]
    pub landscape_highlights: usize,
    #[serde(default = "default_square_highlights")]
    pub square_highlights: usize,
}

fn default_changelog_path() -> PathBuf {
    PathBuf::from(paths::CHANGELOG_FILE)
}

fn default_landscape_highlights() -> usize {
    6
}

fn default_square_highlights() -> usize {
    4
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            path: default_changelog_path(),
            landscape_highlights: default_landscape_highlights(),
            square_highlights: default_square_highlights(),
        }
    }
}

// ---------------------------------------------------------------------------
// CiConfig
// ---------------------------------------------------------------------------

/// Command lines for the best-effort subprocess fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeCommands {
    #[serde(default = "default_build_cmd")]
    pub build: String,
    #[serde(default = "default_test_cmd")]
    pub test: String,
    #[serde(default = "default_lint_cmd")]
    pub lint: String,
    #[serde(default = "default_audit_cmd")]
    pub audit: String,
}

fn default_build_cmd() -> String {
    "npm run build".to_string()
}

fn default_test_cmd() -> String {
    "npm test".to_string()
}

fn default_lint_cmd() -> String {
    "npm run lint".to_string()
}

fn default_audit_cmd() -> String {
    "npm audit --json".to_string()
}

impl Default for ProbeCommands {
    fn default() -> Self {
        Self {
            build: default_build_cmd(),
            test: default_test_cmd(),
            lint: default_lint_cmd(),
            audit: default_audit_cmd(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiConfig {
    #[serde(default = "default_ci_output")]
    pub output: PathBuf,
    /// Run subprocess fallbacks when the CI_* environment is absent.
    #[serde(default = "default_probes")]
    pub probes: bool,
    #[serde(default = "default_coverage_summary")]
    pub coverage_summary: PathBuf,
    #[serde(default)]
    pub commands: ProbeCommands,
}

fn default_ci_output() -> PathBuf {
    PathBuf::from(paths::CI_REPORT_FILE)
}

fn default_probes() -> bool {
    true
}

fn default_coverage_summary() -> PathBuf {
    PathBuf::from(paths::COVERAGE_SUMMARY)
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            output: default_ci_output(),
            probes: default_probes(),
            coverage_summary: default_coverage_summary(),
            commands: ProbeCommands::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub aggregate: AggregateConfig,
    #[serde(default)]
    pub changelog: ChangelogConfig,
    #[serde(default)]
    pub ci: CiConfig,
}

impl Config {
    /// Load `orkit.yaml` from `root`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.aggregate.content_budget == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "aggregate.content_budget is 0: every body will be truncated".to_string(),
            });
        }

        for (category, keywords) in &self.aggregate.categories {
            if keywords.iter().all(|k| k.trim().is_empty()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("category '{category}' has no keywords and will never match"),
                });
            }
        }

        let mut seen = HashSet::new();
        for target in &self.aggregate.outputs {
            if let Some(implied) = EmitFormat::from_path(&target.path) {
                if implied != target.format {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "output '{}' has format {} but its extension suggests {}",
                            target.path.display(),
                            target.format.as_str(),
                            implied.as_str()
                        ),
                    });
                }
            }
            if !seen.insert(&target.path) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "output '{}' is listed more than once; later writes overwrite earlier ones",
                        target.path.display()
                    ),
                });
            }
        }

        if self.changelog.square_highlights > self.changelog.landscape_highlights {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "changelog.square_highlights exceeds landscape_highlights".to_string(),
            });
        }

        if self.ci.probes {
            let cmds = &self.ci.commands;
            for (name, cmd) in [
                ("build", &cmds.build),
                ("test", &cmds.test),
                ("lint", &cmds.lint),
                ("audit", &cmds.audit),
            ] {
                if cmd.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("ci.commands.{name} is empty; that probe will be skipped"),
                    });
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.sources.skills_dir, PathBuf::from("src/skills"));
        assert_eq!(cfg.aggregate.content_budget, 3000);
        assert_eq!(cfg.aggregate.outputs.len(), 2);
        assert!(cfg.ci.probes);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("orkit.yaml"),
            "sources:\n  skills_dir: plugins/ork/skills\nci:\n  probes: false\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.sources.skills_dir, PathBuf::from("plugins/ork/skills"));
        assert_eq!(cfg.sources.agents_dir, PathBuf::from("src/agents"));
        assert!(!cfg.ci.probes);
        assert_eq!(cfg.ci.commands.test, "npm test");
        assert!(cfg.aggregate.categories.contains_key("backend"));
    }

    #[test]
    fn shown_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.aggregate.sample_size = 3;
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        std::fs::write(paths::config_path(dir.path()), yaml).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.aggregate.sample_size, 3);
        assert_eq!(loaded.aggregate.outputs, cfg.aggregate.outputs);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("orkit.yaml"), "aggregate: [unclosed").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn validate_flags_problems() {
        let mut cfg = Config::default();
        cfg.aggregate.content_budget = 0;
        cfg.aggregate.categories.insert("empty".to_string(), vec![]);
        let dup = cfg.aggregate.outputs[0].clone();
        cfg.aggregate.outputs.push(dup);
        cfg.ci.commands.lint = "  ".to_string();

        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 4);
        assert_eq!(
            warnings
                .iter()
                .filter(|w| w.level == WarnLevel::Error)
                .count(),
            1
        );
    }

    #[test]
    fn validate_flags_extension_mismatch() {
        let mut cfg = Config::default();
        cfg.aggregate.outputs = vec![OutputTarget {
            path: PathBuf::from("generated/data.ts"),
            format: EmitFormat::Json,
        }];
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("suggests typescript"));
        assert_eq!(warnings[0].level, WarnLevel::Warning);
    }

    #[test]
    fn emit_format_from_extension() {
        assert_eq!(
            EmitFormat::from_path(Path::new("out/data.ts")),
            Some(EmitFormat::Typescript)
        );
        assert_eq!(
            EmitFormat::from_path(Path::new("site/data.js")),
            Some(EmitFormat::Script)
        );
        assert_eq!(EmitFormat::from_path(Path::new("x.json")), Some(EmitFormat::Json));
        assert_eq!(EmitFormat::from_path(Path::new("x.txt")), None);
    }
}
