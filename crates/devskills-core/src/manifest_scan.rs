use crate::error::Result;
use crate::io::display_relative;
use crate::manifest;
use crate::paths::{MANIFEST_GLOB, MANIFEST_SUFFIX};
use crate::scan::find_files;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub path: String,
    pub name: String,
    pub basename: String,
    pub absolute_path: String,
    #[serde(flatten)]
    pub metadata: ManifestMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ManifestMetadata {
    Valid {
        valid: bool,
        modules_count: usize,
        module_names: Vec<String>,
        routes_count: usize,
    },
    Invalid {
        valid: bool,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub manifests_found: usize,
    pub manifests: Vec<ManifestEntry>,
}

pub fn read_metadata(path: &Path) -> ManifestMetadata {
    match manifest::load(path) {
        Ok(doc) => {
            let module_names = manifest::module_names(&doc);
            ManifestMetadata::Valid {
                valid: true,
                modules_count: module_names.len(),
                module_names,
                routes_count: manifest::route_count(&doc),
            }
        }
        Err(e) => ManifestMetadata::Invalid {
            valid: false,
            error: e.to_string(),
        },
    }
}

/// Every deployment manifest under `root`, test directories excluded,
/// ordered by relative path.
pub fn scan_manifests(root: &Path) -> Result<ScanReport> {
    let mut manifests: Vec<ManifestEntry> = find_files(root, MANIFEST_GLOB)?
        .into_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let basename = name.strip_suffix(MANIFEST_SUFFIX).unwrap_or(&name).to_string();
            ManifestEntry {
                path: display_relative(root, &path),
                basename,
                absolute_path: path.display().to_string(),
                metadata: read_metadata(&path),
                name,
            }
        })
        .collect();
    manifests.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ScanReport {
        manifests_found: manifests.len(),
        manifests,
    })
}
