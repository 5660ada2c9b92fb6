use orkit_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root directory.
///
/// Priority:
/// 1. `--root` flag / `ORKIT_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `orkit.yaml`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd)
}

fn find_root_from(start: &Path) -> PathBuf {
    find_upward(start, |dir| paths::config_path(dir).is_file())
        .or_else(|| find_upward(start, |dir| dir.join(".git").is_dir()))
        .unwrap_or_else(|| start.to_path_buf())
}

fn find_upward(start: &Path, is_root: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start.ancestors().find(|dir| is_root(dir)).map(Path::to_path_buf)
}
