use crate::error::{OrkitError, Result};
use crate::io;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// Which skills (or agents) a plugin bundles: `"all"` or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    All,
    Explicit(Vec<String>),
}

impl Default for Membership {
    fn default() -> Self {
        Membership::Explicit(Vec::new())
    }
}

impl Serialize for Membership {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Membership::All => serializer.serialize_str("all"),
            Membership::Explicit(names) => names.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Membership {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Word(String),
            List(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Word(w) if w == "all" => Ok(Membership::All),
            Raw::Word(w) => Err(de::Error::custom(format!(
                "expected \"all\" or a list of names, got \"{w}\""
            ))),
            Raw::List(names) => Ok(Membership::Explicit(names)),
        }
    }
}

/// Expand `All` to every candidate (order preserved); return an explicit list
/// verbatim, including names that match no candidate.
pub fn resolve_membership(membership: &Membership, all: &[String]) -> Vec<String> {
    match membership {
        Membership::All => all.to_vec(),
        Membership::Explicit(names) => names.clone(),
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub skills: Membership,
    #[serde(default)]
    pub agents: Membership,
}

impl Manifest {
    /// Load one manifest. A missing or malformed file is a hard error: a
    /// broken manifest is an authoring mistake the build must surface.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(OrkitError::ManifestNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let mut manifest: Manifest =
            serde_json::from_str(&data).map_err(|source| OrkitError::ManifestSyntax {
                path: path.display().to_string(),
                source,
            })?;
        if manifest.name.is_empty() {
            manifest.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(manifest)
    }

    /// Every `*.json` manifest in `dir`, sorted by file name.
    pub fn list(dir: &Path) -> Result<Vec<Self>> {
        io::list_files_with_ext(dir, "json")?
            .iter()
            .map(|file| Self::load(&dir.join(file)))
            .collect()
    }

    pub fn skill_names(&self, all: &[String]) -> Vec<String> {
        resolve_membership(&self.skills, all)
    }

    pub fn agent_names(&self, all: &[String]) -> Vec<String> {
        resolve_membership(&self.agents, all)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_expands_to_candidates_in_order() {
        let all = names(&["zeta", "alpha", "mid"]);
        assert_eq!(resolve_membership(&Membership::All, &all), all);
    }

    #[test]
    fn explicit_list_is_returned_verbatim() {
        let all = names(&["alpha", "beta"]);
        let explicit = Membership::Explicit(names(&["beta", "ghost"]));
        assert_eq!(resolve_membership(&explicit, &all), names(&["beta", "ghost"]));
    }

    #[test]
    fn deserializes_all_and_lists() {
        let m: Manifest = serde_json::from_str(
            r#"{"name":"ork","version":"6.0.2","skills":"all","agents":["a","b"]}"#,
        )
        .unwrap();
        assert_eq!(m.skills, Membership::All);
        assert_eq!(m.agents, Membership::Explicit(names(&["a", "b"])));
        assert_eq!(m.version, "6.0.2");
    }

    #[test]
    fn rejects_unknown_sentinel() {
        let result = serde_json::from_str::<Manifest>(r#"{"skills":"some"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn membership_serializes_back_to_json_shape() {
        assert_eq!(serde_json::to_string(&Membership::All).unwrap(), "\"all\"");
        assert_eq!(
            serde_json::to_string(&Membership::Explicit(names(&["x"]))).unwrap(),
            "[\"x\"]"
        );
    }

    #[test]
    fn load_defaults_name_to_file_stem() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ork-core.json");
        std::fs::write(&path, r#"{"version":"1.0.0","skills":["a"]}"#).unwrap();
        let m = Manifest::load(&path).unwrap();
        assert_eq!(m.name, "ork-core");
        assert_eq!(m.agents, Membership::Explicit(Vec::new()));
    }

    #[test]
    fn load_missing_manifest_fails() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, OrkitError::ManifestNotFound(_)));
    }

    #[test]
    fn load_malformed_manifest_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ \"skills\": [").unwrap();
        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, OrkitError::ManifestSyntax { .. }));
    }

    #[test]
    fn list_loads_sorted_json_files_only() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"skills":"all"}"#).unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"skills":[]}"#).unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        let list = Manifest::list(dir.path()).unwrap();
        let names: Vec<&str> = list.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
