use crate::output::print_json;
use crate::root::ensure_exists;
use devskills_core::newlines::fix_trailing_newlines;
use std::path::Path;

pub fn run(dir: &Path, json: bool) -> anyhow::Result<()> {
    ensure_exists(dir)?;
    let report = fix_trailing_newlines(dir)?;

    if json {
        return print_json(&report);
    }

    for file in &report.fixed_files {
        println!("  Fixed: {file}");
    }
    println!();
    println!(
        "Scanned {} files, fixed {}.",
        report.scanned, report.fixed
    );
    Ok(())
}
