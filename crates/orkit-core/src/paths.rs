use crate::error::{OrkitError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Defaults (relative to the project root)
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "orkit.yaml";

pub const SKILLS_DIR: &str = "src/skills";
pub const AGENTS_DIR: &str = "src/agents";
pub const HOOKS_FILE: &str = "src/hooks/hooks.json";
pub const MANIFESTS_DIR: &str = "manifests";
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";
pub const COVERAGE_SUMMARY: &str = "coverage/coverage-summary.json";
pub const CI_REPORT_FILE: &str = "ci-report/index.html";
pub const GENERATED_DIR: &str = "generated";

pub const SKILL_FILE: &str = "SKILL.md";

/// Skill subfolders surfaced in `structure`. Anything else stays invisible.
pub const SKILL_SUBDIRS: &[&str] = &["references", "assets", "scripts", "checklists"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn skill_dir(skills_dir: &Path, name: &str) -> PathBuf {
    skills_dir.join(name)
}

pub fn skill_file(skills_dir: &Path, name: &str) -> PathBuf {
    skill_dir(skills_dir, name).join(SKILL_FILE)
}

pub fn agent_file(agents_dir: &Path, name: &str) -> PathBuf {
    agents_dir.join(format!("{name}.md"))
}

/// `report.html` → `report.json`, next to the HTML file.
pub fn sibling_json(path: &Path) -> PathBuf {
    path.with_extension("json")
}

/// Resolve a configured path against the project root. Absolute paths win.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Skill and agent names are kebab-case slugs.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(OrkitError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["api-design", "a", "rag-retrieval-2", "x1"] {
            validate_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in [
            "",
            "-starts-with-dash",
            "ends-with-dash-",
            "has spaces",
            "UPPER",
            "a_b",
        ] {
            assert!(validate_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn path_helpers() {
        let skills = Path::new("/tmp/proj/src/skills");
        assert_eq!(
            skill_file(skills, "api-design"),
            PathBuf::from("/tmp/proj/src/skills/api-design/SKILL.md")
        );
        assert_eq!(
            agent_file(Path::new("/tmp/proj/src/agents"), "backend-architect"),
            PathBuf::from("/tmp/proj/src/agents/backend-architect.md")
        );
        assert_eq!(
            sibling_json(Path::new("out/ci-report/index.html")),
            PathBuf::from("out/ci-report/index.json")
        );
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            resolve(root, Path::new("/etc/hooks.json")),
            PathBuf::from("/etc/hooks.json")
        );
        assert_eq!(
            resolve(root, Path::new(MANIFESTS_DIR)),
            PathBuf::from("/tmp/proj/manifests")
        );
    }
}
