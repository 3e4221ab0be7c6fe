//! IoT Edge deployment manifest mutation.
//!
//! Modules and routes are stored under flat dotted keys
//! (`properties.desired.modules.<name>`, `properties.desired.routes.<route>`)
//! directly inside `$edgeAgent` / `$edgeHub`. The deployment tooling reads
//! them that way, so they are never expanded into nested objects.

use crate::error::{Result, SkillError};
use crate::io::atomic_write;
use crate::paths::{
    self, EDGE_AGENT, EDGE_HUB, MODULES_CONTENT, MODULE_KEY_PREFIX, ROUTE_KEY_PREFIX,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Startup order given to every newly added module. The highest existing
/// order is reported but not used for placement.
pub const NEW_MODULE_STARTUP_ORDER: u64 = 1;

pub const ROUTE_PRIORITY: u64 = 0;
pub const ROUTE_TTL_SECS: u64 = 86_400;

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn section<'a>(manifest: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    manifest.get(MODULES_CONTENT)?.get(name)?.as_object()
}

fn prefixed<'a>(
    manifest: &'a Value,
    section_name: &str,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
    section(manifest, section_name)
        .into_iter()
        .flat_map(|map| map.iter())
        .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|name| (name, v)))
}

/// Highest `startupOrder` among existing modules, 0 when there are none.
/// Entries without an integer `startupOrder` count as 0.
pub fn highest_startup_order(manifest: &Value) -> u64 {
    prefixed(manifest, EDGE_AGENT, MODULE_KEY_PREFIX)
        .map(|(_, module)| {
            module
                .get("startupOrder")
                .and_then(Value::as_u64)
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
}

pub fn module_exists(manifest: &Value, name: &str) -> bool {
    section(manifest, EDGE_AGENT).is_some_and(|agent| agent.contains_key(&paths::module_key(name)))
}

/// Module names in document order.
pub fn module_names(manifest: &Value) -> Vec<String> {
    prefixed(manifest, EDGE_AGENT, MODULE_KEY_PREFIX)
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn route_count(manifest: &Value) -> usize {
    prefixed(manifest, EDGE_HUB, ROUTE_KEY_PREFIX).count()
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

pub fn module_definition(name: &str, with_volume: bool) -> Value {
    let mut host_config = json!({
        "LogConfig": {
            "Type": "json-file",
            "Config": {
                "max-size": "10m",
                "max-file": "10"
            }
        }
    });
    if with_volume {
        host_config["Mounts"] = json!([
            {
                "Type": "volume",
                "Target": "/app/data/",
                "Source": name
            }
        ]);
    }

    json!({
        "version": "1.0",
        "type": "docker",
        "status": "running",
        "restartPolicy": "always",
        "startupOrder": NEW_MODULE_STARTUP_ORDER,
        "settings": {
            "image": format!("${{MODULES.{name}}}"),
            "createOptions": {
                "HostConfig": host_config
            }
        }
    })
}

pub fn route_definition(name: &str) -> Value {
    json!({
        "route": format!("FROM /messages/modules/{name}/outputs/* INTO $upstream"),
        "priority": ROUTE_PRIORITY,
        "timeToLiveSecs": ROUTE_TTL_SECS
    })
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AddModuleSummary {
    pub module_name: String,
    pub startup_order: u64,
    pub highest_existing_startup_order: u64,
    pub modules_before: usize,
    pub modules_after: usize,
    pub route_added: String,
}

/// Reject documents where a container the mutation writes into exists but
/// is not an object. Runs before any insert so a failure leaves the value
/// untouched.
fn check_shape(manifest: &Value) -> Result<()> {
    let root = manifest
        .as_object()
        .ok_or_else(|| SkillError::InvalidManifest("document root is not an object".into()))?;
    let Some(content) = root.get(MODULES_CONTENT) else {
        return Ok(());
    };
    let content = content
        .as_object()
        .ok_or_else(|| SkillError::InvalidManifest(format!("{MODULES_CONTENT} is not an object")))?;
    for name in [EDGE_AGENT, EDGE_HUB] {
        if content.get(name).is_some_and(|v| !v.is_object()) {
            return Err(SkillError::InvalidManifest(format!(
                "{MODULES_CONTENT}.{name} is not an object"
            )));
        }
    }
    Ok(())
}

fn section_mut<'a>(manifest: &'a mut Value, name: &str) -> Result<&'a mut Map<String, Value>> {
    let root = manifest
        .as_object_mut()
        .ok_or_else(|| SkillError::InvalidManifest("document root is not an object".into()))?;
    root.entry(MODULES_CONTENT)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| SkillError::InvalidManifest(format!("{MODULES_CONTENT} is not an object")))?
        .entry(name)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            SkillError::InvalidManifest(format!("{MODULES_CONTENT}.{name} is not an object"))
        })
}

/// Add a module and its default upstream route to `manifest`.
///
/// `name` is expected to be lowercase already. `registry` is accepted for
/// the caller's bookkeeping only: the stored image is the
/// `${MODULES.<name>}` placeholder that the deployment tooling resolves.
pub fn add_module(
    manifest: &mut Value,
    name: &str,
    registry: &str,
    with_volume: bool,
) -> Result<AddModuleSummary> {
    if module_exists(manifest, name) {
        return Err(SkillError::ModuleExists(name.to_string()));
    }
    check_shape(manifest)?;

    let highest = highest_startup_order(manifest);
    let modules_before = module_names(manifest).len();
    tracing::debug!(module = name, registry, highest, "adding module");

    section_mut(manifest, EDGE_AGENT)?
        .insert(paths::module_key(name), module_definition(name, with_volume));

    let route = paths::route_name(name);
    section_mut(manifest, EDGE_HUB)?.insert(paths::route_key(&route), route_definition(name));

    Ok(AddModuleSummary {
        module_name: name.to_string(),
        startup_order: NEW_MODULE_STARTUP_ORDER,
        highest_existing_startup_order: highest,
        modules_before,
        modules_after: module_names(manifest).len(),
        route_added: route,
    })
}

// ---------------------------------------------------------------------------
// File operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ManifestUpdate {
    pub manifest_path: PathBuf,
    #[serde(flatten)]
    pub summary: AddModuleSummary,
}

pub fn load(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(SkillError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| SkillError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the manifest at `path`, add the module, and rewrite the file with
/// two-space indentation. Nothing is written unless the mutation succeeds.
pub fn update_manifest_file(
    path: &Path,
    name: &str,
    registry: &str,
    with_volume: bool,
) -> Result<ManifestUpdate> {
    let mut manifest = load(path)?;
    let summary = add_module(&mut manifest, name, registry, with_volume)?;
    let rendered = serde_json::to_string_pretty(&manifest)?;
    atomic_write(path, rendered.as_bytes())?;
    tracing::debug!(path = %path.display(), module = name, "manifest updated");
    Ok(ManifestUpdate {
        manifest_path: path.to_path_buf(),
        summary,
    })
}
