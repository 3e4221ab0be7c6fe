use crate::output::print_json;
use crate::root::ensure_exists;
use clap::Subcommand;
use devskills_core::manifest::{update_manifest_file, ManifestUpdate};
use devskills_core::manifest_scan::scan_manifests;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ManifestSubcommand {
    /// Add a module and its default upstream route to a deployment manifest
    Add {
        /// Path to the deployment manifest
        manifest: PathBuf,
        /// Module name (lowercase)
        module: String,
        /// Container registry (e.g. myregistry.azurecr.io)
        #[arg(long)]
        registry: String,
        /// Don't mount a data volume into the module
        #[arg(long)]
        no_volume: bool,
    },

    /// List every deployment manifest under the root
    Scan,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ManifestSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ManifestSubcommand::Add {
            manifest,
            module,
            registry,
            no_volume,
        } => add(&manifest, &module, &registry, !no_volume),
        ManifestSubcommand::Scan => scan(root),
    }
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct AddReport {
    success: bool,
    #[serde(flatten)]
    update: ManifestUpdate,
}

fn add(manifest: &Path, module: &str, registry: &str, with_volume: bool) -> anyhow::Result<()> {
    let update = update_manifest_file(manifest, module, registry, with_volume)?;
    print_json(&AddReport {
        success: true,
        update,
    })
}

// ---------------------------------------------------------------------------
// scan
// ---------------------------------------------------------------------------

fn scan(root: &Path) -> anyhow::Result<()> {
    ensure_exists(root)?;
    let report = scan_manifests(root)?;
    print_json(&report)
}
