//! Command handlers for uptable CLI
//!
//! Each subcommand group has its own module with handler functions. Handlers
//! take the loaded [`Config`] so remembered directories can be updated; the
//! caller persists it.

pub mod configure;
pub mod edit;
pub mod inspect;
pub mod scan;
pub mod table;

#[cfg(test)]
pub(crate) mod fixtures;

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use uptable::{package_paths, Package};

use crate::backup;
use crate::config::Config;

/// Where and how an edited property file is written
#[derive(Debug, Default)]
pub struct SaveOptions {
    pub output: Option<PathBuf>,
    pub backup: bool,
}

/// Open a package, resolving relative paths against the remembered directory
pub fn open_package(config: &mut Config, input: &Path) -> Result<Package> {
    let path = config.resolve_input(input);
    let package = Package::open(&path)
        .with_context(|| format!("Failed to open package {}", path.display()))?;
    config.remember_open(&path);
    Ok(package)
}

/// Select an entry by exact tag, or by zero-based index when no tag matches
pub fn resolve_entry(package: &Package, selector: &str) -> Result<usize> {
    let entries = package.entries();
    if let Some(index) = entries.iter().position(|e| e.tag == selector) {
        return Ok(index);
    }
    match selector.parse::<usize>() {
        Ok(index) if index < entries.len() => Ok(index),
        Ok(index) => bail!(
            "Entry index {} out of range ({} entries)",
            index,
            entries.len()
        ),
        Err(_) => bail!("No entry tagged '{}'", selector),
    }
}

/// Write the property buffer, with an optional backup of the file it replaces
pub fn save_package(config: &mut Config, package: &Package, options: &SaveOptions) -> Result<PathBuf> {
    let target = match &options.output {
        Some(output) => config.resolve_output(output),
        None => {
            let Some(path) = package.path() else {
                bail!("Package has no source path; pass --output");
            };
            package_paths(path)?.1
        }
    };

    if options.backup && target.exists() {
        backup::smart_backup(&target).context("Failed to manage backup")?;
    }

    package
        .save(&target)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    if options.backup {
        backup::update_after_edit(&target).context("Failed to update backup metadata")?;
    }

    config.remember_save(&target);
    Ok(target)
}
