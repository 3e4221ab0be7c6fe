use devskills_core::SkillError;
use std::path::{Path, PathBuf};

/// Resolve the directory scanning commands work from.
///
/// `--root` / `DEVSKILLS_ROOT` wins (passed in as `explicit`), otherwise the
/// current directory. Existing paths are canonicalized.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    let root = match explicit {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    std::fs::canonicalize(&root).unwrap_or(root)
}

pub fn ensure_exists(root: &Path) -> anyhow::Result<()> {
    if !root.is_dir() {
        return Err(SkillError::NotFound(root.to_path_buf()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn missing_root_is_kept_verbatim_and_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let result = resolve_root(Some(&missing));
        assert_eq!(result, missing);
        assert!(ensure_exists(&result).is_err());
    }
}
