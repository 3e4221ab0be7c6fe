use crate::output::print_json;
use crate::root::ensure_exists;
use devskills_core::structure::{detect_project_structure, save_project_config, ConfigSource};
use std::path::Path;

pub fn run(root: &Path, force: bool, save: bool) -> anyhow::Result<()> {
    ensure_exists(root)?;
    let mut config = detect_project_structure(root, force)?;

    if save && config.config_source == ConfigSource::Detected {
        match save_project_config(root, &config) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "saved project config");
                config.config_saved = Some(true);
            }
            Err(e) => tracing::warn!(error = %e, "could not save project config"),
        }
    }

    print_json(&config)
}
