//! Unreal package property-table codec
//!
//! Reads a `.uasset`/`.uexp` pair holding a single export whose serialized
//! data is a flat table of tagged entries, and patches individual field values
//! back into the `.uexp` buffer in place.
//!
//! # Format Overview
//!
//! ## Header file (`.uasset`)
//!
//! - Magic tag `0x9E2A83C1`, version words, package group, section counts and
//!   offsets
//! - Name table at `names_offset`: length-prefixed strings, each followed by a
//!   4-byte hash
//! - Exactly one export record at `exports_offset`
//!
//! ## Property file (`.uexp`)
//!
//! - Bytes 0-9: opaque prologue
//! - Bytes 10-13: entry count
//! - Bytes 14-17: property count
//! - Property descriptors: name reference (8 bytes) + type byte
//! - Entries: tag name reference, then one field per descriptor
//!
//! Every decoded field remembers the byte offset it was read from, so an edit
//! never re-serializes the file and never changes its length.
//!
//! ## Example
//!
//! ```no_run
//! use uptable::{Edit, Package, Scalar};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut package = Package::open("DataTable.uasset")?;
//!
//! for (index, entry) in package.entries().iter().enumerate() {
//!     println!("{index}: {}", entry.tag);
//! }
//!
//! package.apply(&[Edit::scalar(0, "Hp", Scalar::Int32(500))])?;
//! package.save("DataTable.uexp")?;
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod entries;
pub mod header;
pub mod names;
pub mod package;
pub mod patch;
pub mod property;
pub mod schema;
pub mod tabular;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

// Re-export main types
pub use cursor::{Reader, Writer};
pub use entries::{Entry, OffsetMap, PropertyTable, PROLOGUE_SIZE};
pub use header::{parse_asset, Asset, ExportRecord, PackageHeader, MAX_EXACT_INTEGER, PACKAGE_TAG};
pub use names::NameTable;
pub use package::{package_paths, Package, Session};
pub use patch::{apply_edits, Edit};
pub use property::{PropertyType, Scalar, Value};
pub use schema::{PropertyDescriptor, Schema, ARRAY_SUFFIX};
pub use tabular::{export_csv, find, import_csv, ExportOptions, Match};

/// Errors from package decoding and patch writing
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid package tag: expected 0x{expected:08x}, got 0x{actual:08x}")]
    InvalidTag { expected: u32, actual: u32 },

    #[error("Unsupported {field}: 0x{value:08x} (low 16 bits must be zero)")]
    UnsupportedVersion { field: &'static str, value: i32 },

    #[error("Unsupported custom versions: expected 0, got {0}")]
    UnsupportedCustomVersions(i32),

    #[error("Unsupported export count: expected 1, got {0}")]
    UnsupportedExportCount(i32),

    #[error("Unsupported export size {0}: outside exact integer range")]
    UnsupportedSize(i64),

    #[error("Unsupported export offset {0}: outside exact integer range")]
    UnsupportedOffset(i64),

    #[error("Unknown property type {tag} for property '{property}'")]
    UnknownPropertyType { tag: u8, property: String },

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Tag mismatch at entry {entry}: expected '{expected}', got '{actual}'")]
    TagMismatch {
        entry: usize,
        expected: String,
        actual: String,
    },

    #[error("Array index {index} out of range for '{property}' at entry {entry} (length {len})")]
    ArrayIndexOutOfRange {
        entry: usize,
        property: String,
        index: usize,
        len: usize,
    },

    #[error("Entry index {index} out of range ({len} entries)")]
    EntryIndexOutOfRange { index: usize, len: usize },

    #[error("Invalid modification of '{property}': {reason}")]
    InvalidModification { property: String, reason: String },

    #[error("Invalid name '{0}': not present in name table")]
    InvalidName(String),

    #[error("Name index {index} out of range ({len} names)")]
    NameIndexOutOfRange { index: i32, len: usize },

    #[error("Value type mismatch for '{property}': expected {expected}, got {actual}")]
    ValueTypeMismatch {
        property: String,
        expected: PropertyType,
        actual: PropertyType,
    },

    #[error("Invalid {kind} value '{value}': {reason}")]
    InvalidValue {
        kind: PropertyType,
        value: String,
        reason: String,
    },

    #[error("Invalid {field}: {value}")]
    InvalidCount { field: &'static str, value: i64 },

    #[error("Out of bounds: {size} bytes at offset {offset} exceeds buffer length {len}")]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },

    #[error("Invalid package path '{}': expected a .uasset or .uexp file", .0.display())]
    InvalidPath(PathBuf),

    #[error("Table error at line {line}: {message}")]
    Table { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
