use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::warn;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Generated files are always replaced whole, never patched.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read `path` as text. Invalid UTF-8 is replaced rather than failing the read.
pub fn read_text_lossy(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(file = %path.display(), "file is not valid UTF-8, replacing invalid bytes");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Sorted names of the immediate subdirectories of `dir`. Missing dir → empty.
pub fn list_dirs(dir: &Path) -> Result<Vec<String>> {
    list_entries(dir, |ft, _| ft.is_dir())
}

/// Sorted file names in `dir` with the given extension (without the dot).
pub fn list_files_with_ext(dir: &Path, ext: &str) -> Result<Vec<String>> {
    list_entries(dir, |ft, name| {
        ft.is_file()
            && Path::new(name)
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case(ext))
    })
}

/// Sorted names of the plain files directly inside `dir`.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    list_entries(dir, |ft, _| ft.is_file())
}

fn list_entries(dir: &Path, keep: impl Fn(&std::fs::FileType, &str) -> bool) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if keep(&entry.file_type()?, &name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.ts");
        atomic_write(&path, b"export {}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "export {}");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/data.json");
        atomic_write(&path, b"{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn atomic_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        atomic_write(&path, b"first, and longer").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn listings_are_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("zeta")).unwrap();
        std::fs::create_dir_all(dir.path().join("alpha")).unwrap();
        std::fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        std::fs::write(dir.path().join("b.md"), "").unwrap();
        std::fs::write(dir.path().join("a.MD"), "").unwrap();
        std::fs::write(dir.path().join("c.json"), "").unwrap();

        assert_eq!(list_dirs(dir.path()).unwrap(), vec!["alpha", "zeta"]);
        assert_eq!(
            list_files_with_ext(dir.path(), "md").unwrap(),
            vec!["a.MD", "b.md"]
        );
        assert_eq!(list_files(dir.path()).unwrap().len(), 3);
    }

    #[test]
    fn missing_dir_lists_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(list_dirs(&dir.path().join("nope")).unwrap().is_empty());
    }
}
