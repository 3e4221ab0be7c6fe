//! Recursive tree scanning shared by every command that searches a project.
//!
//! Two pieces live here: the test-directory exclusion rule and a small
//! suffix glob (`modules/*/Program.cs`, `*.deployment.manifest.json`) that
//! matches the trailing components of a path relative to the scan root.

use crate::error::Result;
use regex::Regex;
use std::path::{Component, Path, PathBuf};

/// True when `name` looks like a test directory or file (`test`, `Tests`,
/// `TestHarness`, ...).
pub fn is_test_segment(name: &str) -> bool {
    name.to_lowercase().starts_with("test")
}

/// True when any segment of `rel` is a test segment. `rel` is expected to
/// be relative to the scan root, so the location of the root itself never
/// excludes anything.
pub fn is_test_path(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(s) => is_test_segment(&s.to_string_lossy()),
        _ => false,
    })
}

// ---------------------------------------------------------------------------
// Glob
// ---------------------------------------------------------------------------

/// A `/`-separated pattern matched against the last N components of a path.
/// `*` matches any run of characters within one segment, `?` one character.
#[derive(Debug, Clone)]
pub struct Glob {
    segments: Vec<Regex>,
}

impl Glob {
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(segment_regex)
            .collect();
        Self { segments }
    }

    pub fn matches(&self, rel: &Path) -> bool {
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if self.segments.is_empty() || parts.len() < self.segments.len() {
            return false;
        }
        let tail = &parts[parts.len() - self.segments.len()..];
        self.segments
            .iter()
            .zip(tail)
            .all(|(re, part)| re.is_match(part))
    }
}

/// Every literal character is escaped, so the built pattern always compiles.
fn segment_regex(segment: &str) -> Regex {
    let mut re = String::from("^");
    for ch in segment.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).unwrap()
}

// ---------------------------------------------------------------------------
// Walking
// ---------------------------------------------------------------------------

/// Every regular file under `root`, sorted. Directories for which `prune`
/// returns true (given the directory name) are not descended into.
/// Unreadable subdirectories are skipped.
pub fn walk_files(root: &Path, prune: &dyn Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    let mut first = true;

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if first => return Err(e.into()),
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };
        first = false;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !prune(&name) {
                    stack.push(path);
                }
            } else if file_type.is_file() || path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Files under `root` matching `pattern`, excluding test paths, sorted
/// lexically.
pub fn find_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let glob = Glob::new(pattern);
    let files = walk_files(root, &is_test_segment)?
        .into_iter()
        .filter(|path| {
            let rel = path.strip_prefix(root).unwrap_or(path);
            !is_test_path(rel) && glob.matches(rel)
        })
        .collect::<Vec<_>>();
    tracing::debug!(root = %root.display(), pattern, found = files.len(), "scan");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_segments_are_case_insensitive() {
        assert!(is_test_segment("Test"));
        assert!(is_test_segment("tests"));
        assert!(is_test_segment("TestHarness"));
        assert!(!is_test_segment("contest"));
        assert!(!is_test_segment("src"));
    }

    #[test]
    fn test_path_checks_every_segment() {
        assert!(is_test_path(Path::new("a/Test/x.json")));
        assert!(is_test_path(Path::new("a/b/TestData.json")));
        assert!(!is_test_path(Path::new("a/b/y.json")));
    }

    #[test]
    fn glob_matches_trailing_segments() {
        let glob = Glob::new("modules/*/Program.cs");
        assert!(glob.matches(Path::new("src/Edge/modules/filter/Program.cs")));
        assert!(glob.matches(Path::new("modules/filter/Program.cs")));
        assert!(!glob.matches(Path::new("src/filter/Program.cs")));
        assert!(!glob.matches(Path::new("modules/a/b/Program.cs")));
    }

    #[test]
    fn glob_star_within_segment() {
        let glob = Glob::new("*Contracts*.csproj");
        assert!(glob.matches(Path::new("src/Acme.Modules.Contracts.csproj")));
        assert!(!glob.matches(Path::new("src/Acme.Modules.csproj")));
    }

    #[test]
    fn glob_escapes_dots() {
        let glob = Glob::new("*.sln");
        assert!(glob.matches(Path::new("Acme.sln")));
        assert!(!glob.matches(Path::new("Acme.slnx")));
        assert!(!glob.matches(Path::new("Acmexsln")));
    }

    #[test]
    fn find_files_excludes_test_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/Test/x.deployment.manifest.json");
        touch(dir.path(), "a/b/y.deployment.manifest.json");

        let found = find_files(dir.path(), "*.deployment.manifest.json").unwrap();
        assert_eq!(found, vec![dir.path().join("a/b/y.deployment.manifest.json")]);
    }

    #[test]
    fn walk_files_prunes_named_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/a.cs");
        touch(dir.path(), "src/obj/b.cs");

        let found = walk_files(dir.path(), &|name| name == "obj").unwrap();
        assert_eq!(found, vec![dir.path().join("src/a.cs")]);
    }

    #[test]
    fn walk_files_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(walk_files(&dir.path().join("nope"), &|_| false).is_err());
    }
}
