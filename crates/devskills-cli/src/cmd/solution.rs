use crate::output::print_json;
use crate::root::ensure_exists;
use devskills_core::solution::{
    add_project_to_slnx, find_solution, legacy_guidance, AddOutcome, LegacyGuidance,
    SolutionKind,
};
use devskills_core::SkillError;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct AddReport<'a> {
    success: bool,
    message: String,
    solution_path: &'a Path,
    #[serde(flatten)]
    outcome: &'a AddOutcome,
}

#[derive(Serialize)]
struct GuidanceReport<'a> {
    success: bool,
    message: &'static str,
    action: &'static str,
    #[serde(flatten)]
    guidance: &'a LegacyGuidance,
}

pub fn run(
    root: &Path,
    detect: bool,
    add_module: Option<&str>,
    module_name: Option<&str>,
) -> anyhow::Result<()> {
    ensure_exists(root)?;
    let info = find_solution(root)?;

    if detect {
        return print_json(&info);
    }

    let Some(project) = add_module else {
        return Err(
            SkillError::Usage("nothing to do: pass --detect or --add-module <PATH>".into()).into(),
        );
    };

    let path = match (info.kind, info.path) {
        (SolutionKind::None, _) | (_, None) => {
            return Err(SkillError::NoSolution(root.to_path_buf()).into());
        }
        (_, Some(path)) => path,
    };

    if info.kind == SolutionKind::Sln {
        let guidance = legacy_guidance(&path, project, module_name);
        return print_json(&GuidanceReport {
            success: true,
            message: "Manual instructions generated for .sln file",
            action: "manual_instructions",
            guidance: &guidance,
        });
    }

    let outcome = add_project_to_slnx(&path, project)?;
    print_json(&AddReport {
        success: true,
        message: outcome.message(project),
        solution_path: &path,
        outcome: &outcome,
    })
}
