use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Manifest keys
// ---------------------------------------------------------------------------

pub const MODULES_CONTENT: &str = "modulesContent";
pub const EDGE_AGENT: &str = "$edgeAgent";
pub const EDGE_HUB: &str = "$edgeHub";

pub const MODULE_KEY_PREFIX: &str = "properties.desired.modules.";
pub const ROUTE_KEY_PREFIX: &str = "properties.desired.routes.";

pub const MANIFEST_SUFFIX: &str = ".deployment.manifest.json";
pub const MANIFEST_GLOB: &str = "*.deployment.manifest.json";

// ---------------------------------------------------------------------------
// Solution files
// ---------------------------------------------------------------------------

pub const SLNX_GLOB: &str = "*.slnx";
pub const SLN_GLOB: &str = "*.sln";
pub const MODULES_FOLDER: &str = "/modules/";

// ---------------------------------------------------------------------------
// Saved project configuration
// ---------------------------------------------------------------------------

pub const CONFIG_DIR: &str = ".claude";
pub const CONFIG_FILE: &str = ".iot-edge-module-config.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn module_key(name: &str) -> String {
    format!("{MODULE_KEY_PREFIX}{name}")
}

pub fn route_name(module: &str) -> String {
    format!("{module}ToIoTHub")
}

pub fn route_key(route: &str) -> String {
    format!("{ROUTE_KEY_PREFIX}{route}")
}

pub fn saved_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}
