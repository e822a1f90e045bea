//! Commands that patch the property file: set and import

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use uptable::{import_csv, Edit, Package, Scalar};

use super::{open_package, resolve_entry, save_package, SaveOptions};
use crate::config::Config;

/// Field addressed on the command line
#[derive(Debug, Clone)]
pub struct FieldArgs {
    pub entry: String,
    pub property: String,
    pub index: Option<usize>,
}

/// Turn command-line text into an edit typed by the schema
pub fn build_edit(package: &Package, field: &FieldArgs, value: &str) -> Result<Edit> {
    let entry = resolve_entry(package, &field.entry)?;
    let (_, descriptor) = package
        .schema()
        .find(&field.property)
        .ok_or_else(|| uptable::Error::UnknownField(field.property.clone()))?;
    let value = Scalar::parse(descriptor.kind, value)?;

    Ok(Edit {
        entry,
        property: field.property.clone(),
        index: field.index,
        value,
    })
}

/// Overwrite one field and save
pub fn set(
    config: &mut Config,
    input: &Path,
    field: &FieldArgs,
    value: &str,
    save: &SaveOptions,
) -> Result<()> {
    let mut package = open_package(config, input)?;
    let edit = build_edit(&package, field, value)?;

    let before = match edit.index {
        Some(i) => package
            .value(edit.entry, &edit.property)?
            .as_array()
            .and_then(|a| a.get(i))
            .map(ToString::to_string),
        None => Some(package.value(edit.entry, &edit.property)?.to_string()),
    };

    package
        .apply(std::slice::from_ref(&edit))
        .with_context(|| format!("Failed to set {}", field.property))?;
    let target = save_package(config, &package, save)?;

    println!(
        "{}[{}].{}{}: {} -> {}",
        package.entries()[edit.entry].tag,
        edit.entry,
        edit.property,
        edit.index.map(|i| format!("[{}]", i)).unwrap_or_default(),
        before.unwrap_or_default(),
        edit.value
    );
    println!("Saved {}", target.display());
    Ok(())
}

/// Apply the changed cells of a CSV export and save
pub fn import(config: &mut Config, input: &Path, csv: &Path, save: &SaveOptions) -> Result<()> {
    let mut package = open_package(config, input)?;
    let text = fs::read_to_string(csv).with_context(|| format!("Failed to read {}", csv.display()))?;

    let edits = import_csv(package.table(), &text)
        .with_context(|| format!("Failed to import {}", csv.display()))?;
    if edits.is_empty() {
        println!("No changes");
        return Ok(());
    }

    let applied = package.apply(&edits).context("Failed to apply imported edits")?;
    let target = save_package(config, &package, save)?;
    info!(applied, "imported table");

    println!("Applied {} edits", applied);
    println!("Saved {}", target.display());
    Ok(())
}
