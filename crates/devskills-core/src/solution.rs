//! Solution file detection and project registration.
//!
//! `.slnx` (XML) solutions are edited in place. Legacy `.sln` files need a
//! freshly generated project GUID per entry, so they only get instructions.

use crate::error::{Result, SkillError};
use crate::io::atomic_write;
use crate::paths::{MODULES_FOLDER, SLNX_GLOB, SLN_GLOB};
use crate::scan::find_files;
use crate::xml::{self, Element, Node};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Project type GUID for C# projects in legacy solutions.
const CSHARP_PROJECT_TYPE: &str = "FAE04EC0-301F-11D3-BF4B-00C04F79EFBC";

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionKind {
    Slnx,
    Sln,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolutionInfo {
    #[serde(rename = "type")]
    pub kind: SolutionKind,
    pub path: Option<PathBuf>,
    pub name: Option<String>,
}

impl SolutionInfo {
    fn found(kind: SolutionKind, path: PathBuf) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        Self {
            kind,
            path: Some(path),
            name,
        }
    }

    fn none() -> Self {
        Self {
            kind: SolutionKind::None,
            path: None,
            name: None,
        }
    }
}

/// Shallowest candidate wins; ties go to the lexically smaller path.
fn shallowest(root: &Path, mut candidates: Vec<PathBuf>) -> Option<PathBuf> {
    candidates.sort_by_cached_key(|p| {
        let depth = p.strip_prefix(root).unwrap_or(p).components().count();
        (depth, p.clone())
    });
    candidates.into_iter().next()
}

/// Locate the solution under `root`. Any `.slnx` is preferred over any
/// `.sln`; test directories are never considered.
pub fn find_solution(root: &Path) -> Result<SolutionInfo> {
    if let Some(path) = shallowest(root, find_files(root, SLNX_GLOB)?) {
        return Ok(SolutionInfo::found(SolutionKind::Slnx, path));
    }
    if let Some(path) = shallowest(root, find_files(root, SLN_GLOB)?) {
        return Ok(SolutionInfo::found(SolutionKind::Sln, path));
    }
    Ok(SolutionInfo::none())
}

// ---------------------------------------------------------------------------
// .slnx editing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AddOutcome {
    Added {
        /// Zero-based index among the folder's projects.
        insertion_index: usize,
        position: usize,
        total_modules: usize,
    },
    AlreadyExists,
}

impl AddOutcome {
    pub fn message(&self, project_path: &str) -> String {
        match self {
            AddOutcome::Added {
                position,
                total_modules,
                ..
            } => format!("Added module to solution at position {position} of {total_modules}"),
            AddOutcome::AlreadyExists => {
                format!("Module already exists in solution: {project_path}")
            }
        }
    }
}

fn is_modules_folder(el: &Element) -> bool {
    el.name == "Folder" && el.attribute("Name") == Some(MODULES_FOLDER)
}

fn modules_folder_mut(root: &mut Element) -> &mut Element {
    let index = match root.position_of(is_modules_folder) {
        Some(i) => i,
        None => {
            root.children.push(Node::Element(
                Element::new("Folder").with_attribute("Name", MODULES_FOLDER),
            ));
            root.children.len() - 1
        }
    };
    match &mut root.children[index] {
        Node::Element(folder) => folder,
        _ => unreachable!("position_of only yields element indices"),
    }
}

/// Insert a `Project` for `project_path` into the `/modules/` folder of
/// `root`, creating the folder when missing. Projects stay ordered by
/// case-insensitive path.
pub fn insert_project(root: &mut Element, project_path: &str) -> AddOutcome {
    let folder = modules_folder_mut(root);

    let existing: Vec<(usize, String)> = folder
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, node)| match node {
            Node::Element(el) if el.name == "Project" => {
                Some((i, el.attribute("Path").unwrap_or_default().to_string()))
            }
            _ => None,
        })
        .collect();

    if existing.iter().any(|(_, path)| path == project_path) {
        return AddOutcome::AlreadyExists;
    }

    let needle = project_path.to_lowercase();
    let insertion_index = existing
        .iter()
        .position(|(_, path)| needle < path.to_lowercase())
        .unwrap_or(existing.len());

    let child_index = match existing.get(insertion_index) {
        Some((i, _)) => *i,
        None => existing
            .last()
            .map(|(i, _)| i + 1)
            .unwrap_or(folder.children.len()),
    };
    folder.children.insert(
        child_index,
        Node::Element(Element::new("Project").with_attribute("Path", project_path)),
    );

    AddOutcome::Added {
        insertion_index,
        position: insertion_index + 1,
        total_modules: existing.len() + 1,
    }
}

/// Register `project_path` in the `.slnx` at `slnx_path`. The file is only
/// rewritten when a project was actually inserted.
pub fn add_project_to_slnx(slnx_path: &Path, project_path: &str) -> Result<AddOutcome> {
    if !slnx_path.exists() {
        return Err(SkillError::NotFound(slnx_path.to_path_buf()));
    }
    let content = std::fs::read_to_string(slnx_path)?;
    let mut root = xml::parse(&content).map_err(|e| SkillError::MalformedXml {
        path: slnx_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let outcome = insert_project(&mut root, project_path);
    if let AddOutcome::Added { .. } = outcome {
        atomic_write(slnx_path, xml::render(&mut root).as_bytes())?;
    }
    tracing::debug!(solution = %slnx_path.display(), project_path, ?outcome, "slnx update");
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// .sln guidance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LegacyGuidance {
    pub solution_path: PathBuf,
    pub module_name: String,
    pub instructions: String,
}

/// Display name used in guidance when none is given: the project file stem.
pub fn default_module_name(project_path: &str) -> String {
    Path::new(project_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_path.to_string())
}

pub fn legacy_instructions(project_path: &str, module_name: &str) -> String {
    format!(
        r#"
Adding a project to a .sln file:

.sln entries carry a project GUID that has to be generated. Pick one of:

Option 1: dotnet CLI (recommended)
    dotnet sln add "{project_path}"

Option 2: Visual Studio
    1. Open the solution
    2. Right-click the solution in Solution Explorer
    3. Add > Existing Project...
    4. Select: {project_path}

Option 3: Edit the file by hand
    1. Open the .sln file in a text editor
    2. Generate a new GUID (PowerShell: [guid]::NewGuid(), or uuidgen)
    3. Add the project entry:

       Project("{{{CSHARP_PROJECT_TYPE}}}") = "{module_name}", "{project_path}", "{{YOUR-NEW-GUID}}"
       EndProject

    4. Add the GUID to the solution configuration platforms section, following the existing entries

The dotnet CLI handles GUID generation and configuration entries for you.
"#
    )
}

pub fn legacy_guidance(
    solution_path: &Path,
    project_path: &str,
    module_name: Option<&str>,
) -> LegacyGuidance {
    let module_name = module_name
        .map(str::to_string)
        .unwrap_or_else(|| default_module_name(project_path));
    LegacyGuidance {
        solution_path: solution_path.to_path_buf(),
        instructions: legacy_instructions(project_path, &module_name),
        module_name,
    }
}
