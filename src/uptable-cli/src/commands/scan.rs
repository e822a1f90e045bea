//! Directory scan: which packages under a tree decode

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;
use uptable::Package;

use crate::file_utils::collect_files_with_extension;

/// Outcome of decoding one package
#[derive(Debug)]
pub struct ScanResult {
    pub path: PathBuf,
    pub outcome: std::result::Result<ScanSummary, String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ScanSummary {
    pub object_name: String,
    pub properties: usize,
    pub entries: usize,
}

/// Try to decode every `.uasset` under `dir`
pub fn scan_dir(dir: &Path) -> Result<Vec<ScanResult>> {
    let results = collect_files_with_extension(dir, &["uasset"])?
        .into_iter()
        .map(|path| {
            let outcome = Package::open(&path)
                .map(|package| ScanSummary {
                    object_name: package.export().object_name.clone(),
                    properties: package.schema().len(),
                    entries: package.entries().len(),
                })
                .map_err(|e| e.to_string());
            debug!(path = %path.display(), ok = outcome.is_ok(), "scanned package");
            ScanResult { path, outcome }
        })
        .collect();

    Ok(results)
}

/// Print scan results and a summary line
pub fn scan(dir: &Path) -> Result<()> {
    let results = scan_dir(dir)?;
    let mut decoded = 0;

    for result in &results {
        let shown = result.path.strip_prefix(dir).unwrap_or(&result.path);
        match &result.outcome {
            Ok(summary) => {
                decoded += 1;
                println!(
                    "  OK    {} ({}: {} properties, {} entries)",
                    shown.display(),
                    summary.object_name,
                    summary.properties,
                    summary.entries
                );
            }
            Err(err) => println!("  FAIL  {}: {}", shown.display(), err),
        }
    }

    println!();
    println!("{} of {} packages decoded", decoded, results.len());
    Ok(())
}
