//! Read-only package commands: info, dump and get

use anyhow::{Context, Result};
use serde_json::{json, Map};
use std::fs;
use std::path::Path;
use uptable::{Package, Value};

use super::{open_package, resolve_entry};
use crate::config::Config;

/// Print header, export and schema summary
pub fn info(config: &mut Config, input: &Path) -> Result<()> {
    let package = open_package(config, input)?;
    let header = package.header();
    let export = package.export();

    println!("Package: {}", input.display());
    println!("  Legacy version:  {}", header.legacy_version);
    if let Some(ue3) = header.legacy_ue3_version {
        println!("  UE3 version:     {}", ue3);
    }
    println!("  Package group:   {}", header.package_group);
    println!("  Package flags:   0x{:08x}", header.package_flags);
    println!("  Names:           {}", package.names().len());
    println!();
    println!("Export: {}", export.object_name);
    println!("  Object flags:    0x{:08x}", export.object_flags);
    println!("  Serial size:     {}", export.serial_size);
    println!("  Serial offset:   {}", export.serial_offset);
    println!("  Property file:   {} bytes", package.data().len());
    println!();
    println!(
        "Schema: {} properties, {} entries",
        package.schema().len(),
        package.entries().len()
    );
    for descriptor in package.schema() {
        let shape = if descriptor.is_array() { "[]" } else { "" };
        println!("  {:<32} {}{}", descriptor.name, descriptor.kind, shape);
    }

    Ok(())
}

/// JSON view of a package: names, export summary, schema and entries
///
/// Each entry is an object keyed by property name, with its tag under `_tag`.
pub fn dump_json(package: &Package) -> Result<serde_json::Value> {
    let export = package.export();

    let mut entries = Vec::with_capacity(package.entries().len());
    for entry in package.entries() {
        let mut object = Map::new();
        object.insert("_tag".to_string(), json!(entry.tag));
        for (descriptor, value) in package.schema().iter().zip(&entry.values) {
            object.insert(descriptor.name.clone(), serde_json::to_value(value)?);
        }
        entries.push(serde_json::Value::Object(object));
    }

    Ok(json!({
        "names": package.names(),
        "export": {
            "objectName": export.object_name,
            "serialSize": export.serial_size,
            "serialOffset": export.serial_offset,
        },
        "props": package.schema(),
        "entries": entries,
    }))
}

/// Dump a package as pretty JSON to stdout or a file
pub fn dump(config: &mut Config, input: &Path, output: Option<&Path>) -> Result<()> {
    let package = open_package(config, input)?;
    let json = serde_json::to_string_pretty(&dump_json(&package)?)?;

    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Look up one value by entry selector, property and optional element index
pub fn lookup(
    package: &Package,
    entry: &str,
    property: &str,
    index: Option<usize>,
) -> Result<String> {
    let entry = resolve_entry(package, entry)?;
    let value = package.value(entry, property)?;

    match (value, index) {
        (Value::Array(elements), Some(i)) => elements
            .get(i)
            .map(ToString::to_string)
            .with_context(|| {
                format!(
                    "Index {} out of range for {} (length {})",
                    i,
                    property,
                    elements.len()
                )
            }),
        (Value::Scalar(_), Some(_)) => anyhow::bail!("{} is not an array", property),
        (value, None) => Ok(value.to_string()),
    }
}

/// Print one value
pub fn get(
    config: &mut Config,
    input: &Path,
    entry: &str,
    property: &str,
    index: Option<usize>,
) -> Result<()> {
    let package = open_package(config, input)?;
    println!("{}", lookup(&package, entry, property, index)?);
    Ok(())
}
