//! Infer an IoT Edge project's layout from what is already on disk.
//!
//! Every lookup is best effort: a missing or unreadable file just leaves
//! the corresponding field empty.

use crate::error::Result;
use crate::io::{atomic_write, display_relative};
use crate::paths::{self, MANIFEST_GLOB};
use crate::scan::find_files;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const MODULE_JSON_SAMPLE: usize = 5;
const CSHARP_SAMPLE: usize = 10;
const DOCKERFILE_SAMPLE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Saved,
    #[default]
    Detected,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub config_source: ConfigSource,
    pub modules_base_path: Option<String>,
    pub contracts_project_path: Option<String>,
    pub contracts_project_name: Option<String>,
    pub manifests_found: Vec<String>,
    pub manifests_base_path: Option<String>,
    pub project_namespace: Option<String>,
    pub container_registry: Option<String>,
    pub nuget_feed_url: Option<String>,
    pub has_contracts_project: bool,
    pub has_nuget_feed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_saved: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractsProject {
    pub path: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static NAMESPACE_RE: OnceLock<Regex> = OnceLock::new();
static REGISTRY_RE: OnceLock<Regex> = OnceLock::new();
static NUGET_RE: OnceLock<Regex> = OnceLock::new();

fn namespace_re() -> &'static Regex {
    NAMESPACE_RE.get_or_init(|| {
        Regex::new(r"namespace\s+([A-Za-z0-9.]+?)\.Modules(?:\.Contracts)?(?:\.[A-Za-z0-9]+)?;")
            .unwrap()
    })
}

fn registry_re() -> &'static Regex {
    REGISTRY_RE.get_or_init(|| Regex::new(r#""repository":\s*"([^/"]+)/[^"]+""#).unwrap())
}

/// Matches `"endpoint":"https://.../nuget/v3/index.json"` both as plain JSON
/// and with the quotes backslash-escaped inside a Dockerfile `ENV` line.
fn nuget_re() -> &'static Regex {
    NUGET_RE.get_or_init(|| {
        Regex::new(r#"endpoint\\?"\s*:\s*\\?"(https://[^"\\]+/nuget/v3/index\.json)\\?""#).unwrap()
    })
}

fn first_capture(files: &[PathBuf], re: &Regex) -> Option<String> {
    files.iter().find_map(|file| match std::fs::read_to_string(file) {
        Ok(content) => re.captures(&content).map(|c| c[1].to_string()),
        Err(e) => {
            tracing::warn!(file = %file.display(), error = %e, "skipping unreadable file");
            None
        }
    })
}

fn relative_dir(root: &Path, dir: &Path) -> String {
    let rel = display_relative(root, dir);
    if rel.is_empty() {
        ".".to_string()
    } else {
        rel
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Directory holding the module folders, found through `modules/*/Program.cs`.
pub fn find_modules_base_path(root: &Path) -> Result<Option<String>> {
    let programs = find_files(root, "modules/*/Program.cs")?;
    Ok(programs
        .first()
        .and_then(|p| p.parent())
        .and_then(|module_dir| module_dir.parent())
        .map(|modules_dir| relative_dir(root, modules_dir)))
}

pub fn find_contracts_project(root: &Path) -> Result<Option<ContractsProject>> {
    let mut candidates = find_files(root, "*Modules.Contracts*.csproj")?;
    if candidates.is_empty() {
        candidates = find_files(root, "*Contracts*.csproj")?;
    }
    Ok(candidates.first().map(|csproj| ContractsProject {
        path: relative_dir(root, csproj.parent().unwrap_or(root)),
        name: csproj
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }))
}

pub fn find_deployment_manifests(root: &Path) -> Result<Vec<String>> {
    Ok(find_files(root, MANIFEST_GLOB)?
        .iter()
        .map(|p| display_relative(root, p))
        .collect())
}

/// Base namespace in front of `.Modules`, read from the contracts project's
/// sources or, failing that, from a sample of module sources.
pub fn extract_namespace(root: &Path, contracts_path: Option<&str>) -> Result<Option<String>> {
    let mut sources = Vec::new();
    if let Some(contracts) = contracts_path {
        let dir = root.join(contracts);
        if dir.is_dir() {
            sources = find_files(&dir, "*.cs")?;
        }
    }
    if sources.is_empty() {
        sources = find_files(root, "modules/*/*.cs")?;
        sources.truncate(CSHARP_SAMPLE);
    }
    Ok(first_capture(&sources, namespace_re()))
}

pub fn extract_container_registry(root: &Path, manifests: &[String]) -> Result<Option<String>> {
    let mut module_jsons = find_files(root, "modules/*/module.json")?;
    module_jsons.truncate(MODULE_JSON_SAMPLE);
    if let Some(registry) = first_capture(&module_jsons, registry_re()) {
        return Ok(Some(registry));
    }
    let manifests: Vec<PathBuf> = manifests.iter().map(|m| root.join(m)).collect();
    Ok(first_capture(&manifests, registry_re()))
}

pub fn extract_nuget_feed_url(root: &Path) -> Result<Option<String>> {
    let mut dockerfiles = find_files(root, "modules/*/Dockerfile*")?;
    dockerfiles.truncate(DOCKERFILE_SAMPLE);
    Ok(first_capture(&dockerfiles, nuget_re()))
}

// ---------------------------------------------------------------------------
// Saved configuration
// ---------------------------------------------------------------------------

/// The saved configuration, if present, readable and non-empty. A file
/// holding `{}` or a non-object value counts as absent.
pub fn load_saved_config(root: &Path) -> Option<ProjectConfig> {
    let path = paths::saved_config_path(root);
    let content = std::fs::read_to_string(&path).ok()?;
    let parsed = serde_json::from_str::<serde_json::Value>(&content).and_then(|value| {
        if value.as_object().is_some_and(|map| !map.is_empty()) {
            serde_json::from_value(value).map(Some)
        } else {
            Ok(None)
        }
    });
    match parsed {
        Ok(Some(config)) => Some(config),
        Ok(None) => {
            tracing::warn!(path = %path.display(), "ignoring empty saved config");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable saved config");
            None
        }
    }
}

pub fn save_project_config(root: &Path, config: &ProjectConfig) -> Result<PathBuf> {
    let path = paths::saved_config_path(root);
    let data = serde_json::to_string_pretty(config)?;
    atomic_write(&path, data.as_bytes())?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

pub fn detect(root: &Path) -> Result<ProjectConfig> {
    let modules_base_path = find_modules_base_path(root)?;
    let contracts = find_contracts_project(root)?;
    let manifests_found = find_deployment_manifests(root)?;

    let contracts_path = contracts.as_ref().map(|c| c.path.as_str());
    let project_namespace = extract_namespace(root, contracts_path)?;
    let container_registry = extract_container_registry(root, &manifests_found)?;
    let nuget_feed_url = extract_nuget_feed_url(root)?;

    let manifests_base_path = manifests_found.first().map(|m| match m.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => String::new(),
    });

    Ok(ProjectConfig {
        config_source: ConfigSource::Detected,
        modules_base_path,
        contracts_project_path: contracts.as_ref().map(|c| c.path.clone()),
        contracts_project_name: contracts.as_ref().map(|c| c.name.clone()),
        manifests_found,
        manifests_base_path,
        project_namespace,
        container_registry,
        has_contracts_project: contracts.is_some(),
        has_nuget_feed: nuget_feed_url.is_some(),
        nuget_feed_url,
        config_saved: None,
    })
}

/// Saved configuration unless `force`, otherwise a fresh detection.
pub fn detect_project_structure(root: &Path, force: bool) -> Result<ProjectConfig> {
    if !force {
        if let Some(mut saved) = load_saved_config(root) {
            saved.config_source = ConfigSource::Saved;
            return Ok(saved);
        }
    }
    detect(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn sample_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/Edge/modules/filter/Program.cs", "class Program {}");
        write(
            root,
            "src/Edge/modules/filter/module.json",
            r#"{"image": {"repository": "acme.azurecr.io/filter"}}"#,
        );
        write(
            root,
            "src/Edge/modules/filter/Dockerfile.amd64",
            r#"ENV VSS_NUGET_EXTERNAL_FEED_ENDPOINTS="{\"endpointCredentials\": [{\"endpoint\":\"https://pkgs.dev.azure.com/acme/_packaging/feed/nuget/v3/index.json\"}]}""#,
        );
        write(
            root,
            "src/Acme.Modules.Contracts/Acme.Modules.Contracts.csproj",
            "<Project />",
        );
        write(
            root,
            "src/Acme.Modules.Contracts/Filter/FilterOptions.cs",
            "namespace Acme.Edge.Modules.Contracts.Filter;\npublic class FilterOptions {}",
        );
        write(root, "src/Edge/dev.deployment.manifest.json", "{}");
        write(root, "tests/Edge/x.deployment.manifest.json", "{}");
        dir
    }

    #[test]
    fn detect_finds_every_field() {
        let dir = sample_project();
        let config = detect(dir.path()).unwrap();

        assert_eq!(config.config_source, ConfigSource::Detected);
        assert_eq!(config.modules_base_path.as_deref(), Some("src/Edge/modules"));
        assert_eq!(
            config.contracts_project_path.as_deref(),
            Some("src/Acme.Modules.Contracts")
        );
        assert_eq!(
            config.contracts_project_name.as_deref(),
            Some("Acme.Modules.Contracts")
        );
        assert_eq!(config.manifests_found, vec!["src/Edge/dev.deployment.manifest.json"]);
        assert_eq!(config.manifests_base_path.as_deref(), Some("src/Edge"));
        assert_eq!(config.project_namespace.as_deref(), Some("Acme.Edge"));
        assert_eq!(config.container_registry.as_deref(), Some("acme.azurecr.io"));
        assert_eq!(
            config.nuget_feed_url.as_deref(),
            Some("https://pkgs.dev.azure.com/acme/_packaging/feed/nuget/v3/index.json")
        );
        assert!(config.has_contracts_project);
        assert!(config.has_nuget_feed);
    }

    #[test]
    fn detect_empty_tree_yields_empty_fields() {
        let dir = TempDir::new().unwrap();
        let config = detect(dir.path()).unwrap();
        assert_eq!(config.modules_base_path, None);
        assert!(config.manifests_found.is_empty());
        assert_eq!(config.manifests_base_path, None);
        assert!(!config.has_contracts_project);
        assert!(!config.has_nuget_feed);
    }

    #[test]
    fn registry_falls_back_to_manifests() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "prod.deployment.manifest.json",
            r#"{"x": {"repository": "contoso.azurecr.io/sensor"}}"#,
        );
        let manifests = find_deployment_manifests(dir.path()).unwrap();
        assert_eq!(
            extract_container_registry(dir.path(), &manifests).unwrap().as_deref(),
            Some("contoso.azurecr.io")
        );
    }

    #[test]
    fn nuget_matches_plain_quotes() {
        let caps = nuget_re()
            .captures(r#"{"endpoint": "https://feed.example/nuget/v3/index.json"}"#)
            .unwrap();
        assert_eq!(&caps[1], "https://feed.example/nuget/v3/index.json");
    }

    #[test]
    fn namespace_without_contracts_segment() {
        let caps = namespace_re().captures("namespace Contoso.Modules.Sensor;").unwrap();
        assert_eq!(&caps[1], "Contoso");
    }

    #[test]
    fn saved_config_wins_unless_forced() {
        let dir = sample_project();
        let mut detected = detect(dir.path()).unwrap();
        detected.container_registry = Some("saved.azurecr.io".into());
        save_project_config(dir.path(), &detected).unwrap();

        let loaded = detect_project_structure(dir.path(), false).unwrap();
        assert_eq!(loaded.config_source, ConfigSource::Saved);
        assert_eq!(loaded.container_registry.as_deref(), Some("saved.azurecr.io"));

        let forced = detect_project_structure(dir.path(), true).unwrap();
        assert_eq!(forced.config_source, ConfigSource::Detected);
        assert_eq!(forced.container_registry.as_deref(), Some("acme.azurecr.io"));
    }

    #[test]
    fn unreadable_saved_config_is_ignored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".claude/.iot-edge-module-config.json", "not json");
        let config = detect_project_structure(dir.path(), false).unwrap();
        assert_eq!(config.config_source, ConfigSource::Detected);
    }

    #[test]
    fn empty_saved_config_falls_back_to_detection() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".claude/.iot-edge-module-config.json", "{}");
        write(dir.path(), "src/modules/filter/Program.cs", "class P {}");
        let config = detect_project_structure(dir.path(), false).unwrap();
        assert_eq!(config.config_source, ConfigSource::Detected);
        assert_eq!(config.modules_base_path.as_deref(), Some("src/modules"));
    }
}
