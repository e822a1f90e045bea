//! Package aggregate and the caller-owned session holding it

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::entries::{Entry, OffsetMap, PropertyTable};
use crate::header::{parse_asset, Asset, ExportRecord, PackageHeader};
use crate::patch::{apply_edits, Edit};
use crate::property::Value;
use crate::schema::Schema;
use crate::{Error, NameTable, Result};

/// Derive the `.uasset` and `.uexp` paths from either one
pub fn package_paths(path: &Path) -> Result<(PathBuf, PathBuf)> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("uasset") || ext.eq_ignore_ascii_case("uexp") => {
            Ok((path.with_extension("uasset"), path.with_extension("uexp")))
        }
        _ => Err(Error::InvalidPath(path.to_path_buf())),
    }
}

/// A decoded header/property file pair plus the mutable property buffer
///
/// The buffer keeps its original length for the lifetime of the package.
#[derive(Debug, Clone)]
pub struct Package {
    asset: Asset,
    table: PropertyTable,
    data: Vec<u8>,
    path: Option<PathBuf>,
}

impl Package {
    /// Read and decode a package from disk
    ///
    /// `path` may name either file of the pair.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let (asset_path, uexp_path) = package_paths(path.as_ref())?;
        let asset_bytes = fs::read(&asset_path)?;
        let uexp_bytes = fs::read(&uexp_path)?;

        let mut package = Self::from_bytes(&asset_bytes, uexp_bytes)?;
        info!(
            path = %asset_path.display(),
            entries = package.entries().len(),
            "opened package"
        );
        package.path = Some(asset_path);
        Ok(package)
    }

    /// Decode a package from in-memory file images
    pub fn from_bytes(asset: &[u8], uexp: Vec<u8>) -> Result<Self> {
        let asset = parse_asset(asset)?;
        let table = PropertyTable::parse(&uexp, &asset.names)?;

        let serial_size = asset.export.serial_size;
        if serial_size < 0 || serial_size as u64 > uexp.len() as u64 {
            warn!(
                serial_size,
                len = uexp.len(),
                "export serial size does not fit the property file"
            );
        }

        Ok(Self {
            asset,
            table,
            data: uexp,
            path: None,
        })
    }

    /// Header file path this package was opened from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn header(&self) -> &PackageHeader {
        &self.asset.header
    }

    pub fn names(&self) -> &NameTable {
        &self.asset.names
    }

    pub fn export(&self) -> &ExportRecord {
        &self.asset.export
    }

    pub fn table(&self) -> &PropertyTable {
        &self.table
    }

    pub fn schema(&self) -> &Schema {
        self.table.schema()
    }

    pub fn entries(&self) -> &[Entry] {
        self.table.entries()
    }

    pub fn offsets(&self) -> &OffsetMap {
        self.table.offsets()
    }

    /// Current property file bytes, including applied edits
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn value(&self, entry: usize, property: &str) -> Result<&Value> {
        self.table.value(entry, property)
    }

    /// Patch a batch of edits into the property buffer
    pub fn apply(&mut self, edits: &[Edit]) -> Result<usize> {
        apply_edits(&mut self.table, &self.asset.names, &mut self.data, edits)
    }

    /// Write the whole property buffer to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.data)?;
        info!(path = %path.display(), bytes = self.data.len(), "saved property file");
        Ok(())
    }

    /// Apply edits, then write the buffer in one pass
    pub fn patch_and_save(&mut self, edits: &[Edit], path: impl AsRef<Path>) -> Result<usize> {
        let applied = self.apply(edits)?;
        self.save(path)?;
        Ok(applied)
    }
}

/// Holder for at most one live package
#[derive(Debug, Default)]
pub struct Session {
    package: Option<Package>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a package, replacing the current one only on success
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<&mut Package> {
        let package = Package::open(path)?;
        Ok(self.package.insert(package))
    }

    /// Decode in-memory file images, replacing the current package only on success
    pub fn load(&mut self, asset: &[u8], uexp: Vec<u8>) -> Result<&mut Package> {
        let package = Package::from_bytes(asset, uexp)?;
        Ok(self.package.insert(package))
    }

    pub fn package(&self) -> Option<&Package> {
        self.package.as_ref()
    }

    pub fn package_mut(&mut self) -> Option<&mut Package> {
        self.package.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.package.is_some()
    }

    /// Drop the current package, returning it
    pub fn close(&mut self) -> Option<Package> {
        self.package.take()
    }
}
