//! Remove trailing newlines from source files (StyleCop SA1518 with
//! `insert_final_newline = false`).

use crate::error::Result;
use crate::io::{atomic_write, display_relative};
use crate::scan::walk_files;
use serde::Serialize;
use std::path::Path;

pub const EXTENSIONS: &[&str] = &[
    "cs",
    "xaml",
    "axaml",
    "csproj",
    "props",
    "targets",
    "editorconfig",
];

pub const EXCLUDED_DIRS: &[&str] = &["bin", "obj", ".vs", ".git", "node_modules"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct FixReport {
    pub scanned: usize,
    pub fixed: usize,
    pub fixed_files: Vec<String>,
}

/// `data` without any trailing `\r` / `\n` bytes.
pub fn trim_trailing_newlines(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |i| i + 1);
    &data[..end]
}

fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.iter().any(|d| d.eq_ignore_ascii_case(name))
}

/// Files are matched on their extension. A dotfile such as `.editorconfig`
/// has no extension, so its name after the leading dot is used instead.
fn has_target_extension(path: &Path) -> bool {
    let ext = match path.extension() {
        Some(ext) => Some(ext.to_string_lossy().to_lowercase()),
        None => path
            .file_name()
            .map(|name| name.to_string_lossy())
            .and_then(|name| name.strip_prefix('.').map(str::to_lowercase)),
    };
    ext.is_some_and(|ext| EXTENSIONS.contains(&ext.as_str()))
}

pub fn fix_trailing_newlines(dir: &Path) -> Result<FixReport> {
    let mut report = FixReport::default();

    for path in walk_files(dir, &is_excluded_dir)? {
        if !has_target_extension(&path) {
            continue;
        }
        report.scanned += 1;

        let data = std::fs::read(&path)?;
        if data.is_empty() {
            continue;
        }
        let trimmed = trim_trailing_newlines(&data);
        if trimmed.len() != data.len() {
            atomic_write(&path, trimmed)?;
            let rel = display_relative(dir, &path);
            tracing::debug!(file = %rel, removed = data.len() - trimmed.len(), "trimmed");
            report.fixed_files.push(rel);
            report.fixed += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn trims_every_trailing_newline_kind() {
        assert_eq!(trim_trailing_newlines(b"class A {}\r\n\r\n"), b"class A {}");
        assert_eq!(trim_trailing_newlines(b"x\n\r\n"), b"x");
        assert_eq!(trim_trailing_newlines(b"x"), b"x");
        assert_eq!(trim_trailing_newlines(b"\n\n"), b"");
    }

    #[test]
    fn keeps_interior_and_trailing_spaces() {
        assert_eq!(trim_trailing_newlines(b"a\n\nb  \n"), b"a\n\nb  ");
    }

    #[test]
    fn matches_extensions_case_insensitively() {
        assert!(has_target_extension(Path::new("src/A.CS")));
        assert!(has_target_extension(Path::new("Directory.Build.props")));
        assert!(has_target_extension(Path::new(".editorconfig")));
        assert!(!has_target_extension(Path::new("README.md")));
        assert!(!has_target_extension(Path::new("build/targets")));
        assert!(!has_target_extension(Path::new("cs")));
    }

    #[test]
    fn extensionless_files_named_like_an_extension_are_left_alone() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("targets"), "data\n").unwrap();
        std::fs::write(root.join("cs"), "data\n").unwrap();
        std::fs::write(root.join(".editorconfig"), "root = true\n").unwrap();

        let report = fix_trailing_newlines(root).unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.fixed_files, vec![".editorconfig"]);
        assert_eq!(std::fs::read(root.join("targets")).unwrap(), b"data\n");
        assert_eq!(std::fs::read(root.join("cs")).unwrap(), b"data\n");
    }

    #[test]
    fn fixes_files_and_skips_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/obj")).unwrap();
        std::fs::create_dir_all(root.join("src/Tests")).unwrap();
        std::fs::write(root.join("src/A.cs"), "class A {}\r\n").unwrap();
        std::fs::write(root.join("src/B.cs"), "class B {}").unwrap();
        std::fs::write(root.join("src/Empty.cs"), "").unwrap();
        std::fs::write(root.join("src/notes.md"), "notes\n").unwrap();
        std::fs::write(root.join("src/obj/Gen.cs"), "gen\n").unwrap();
        std::fs::write(root.join("src/Tests/T.cs"), "t\n").unwrap();

        let report = fix_trailing_newlines(root).unwrap();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.fixed, 2);
        assert_eq!(report.fixed_files, vec!["src/A.cs", "src/Tests/T.cs"]);
        assert_eq!(std::fs::read(root.join("src/A.cs")).unwrap(), b"class A {}");
        assert_eq!(std::fs::read(root.join("src/obj/Gen.cs")).unwrap(), b"gen\n");
        assert_eq!(std::fs::read(root.join("src/notes.md")).unwrap(), b"notes\n");
    }
}
