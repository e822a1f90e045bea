//! Tabular commands: export and find

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use uptable::{export_csv, find as find_cells, ExportOptions};

use super::open_package;
use crate::config::Config;

/// Export the entry table as CSV
pub fn export(
    config: &mut Config,
    input: &Path,
    output: Option<&Path>,
    formula_escape: Option<bool>,
) -> Result<()> {
    let package = open_package(config, input)?;
    let options = ExportOptions {
        formula_escape: formula_escape.unwrap_or(config.formula_escape),
    };
    let csv = export_csv(package.table(), &options);

    match output {
        Some(path) => {
            let path = config.resolve_output(path);
            fs::write(&path, csv).with_context(|| format!("Failed to write {}", path.display()))?;
            config.remember_save(&path);
            println!(
                "Exported {} entries to {}",
                package.entries().len(),
                path.display()
            );
        }
        None => print!("{}", csv),
    }

    Ok(())
}

/// Print every cell containing `text`
pub fn find(config: &mut Config, input: &Path, text: &str) -> Result<()> {
    let package = open_package(config, input)?;
    let matches = find_cells(package.table(), text);

    for hit in &matches {
        println!(
            "{:>6}  {:<24} {:<32} {}",
            hit.entry,
            package.entries()[hit.entry].tag,
            hit.column,
            hit.text
        );
    }
    println!("{} matches", matches.len());
    Ok(())
}
