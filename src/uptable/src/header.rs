//! Package header, name table and export record decoding
//!
//! Only one serialization profile is accepted: unversioned primary and
//! licensee versions, no custom versions, and exactly one export. Anything
//! else is rejected before the name table is read.

use serde::Serialize;
use tracing::debug;

use crate::cursor::{non_negative, Reader};
use crate::{Error, NameTable, Result};

/// Magic tag at the start of every package file
pub const PACKAGE_TAG: u32 = 0x9E2A_83C1;

/// Largest magnitude a 64-bit size or offset may have (2^53 - 1)
pub const MAX_EXACT_INTEGER: i64 = (1 << 53) - 1;

/// Legacy version that omits the UE3 version field
const LEGACY_VERSION_WITHOUT_UE3: i32 = -4;

/// Legacy versions at or below this carry a custom version container
const LEGACY_VERSION_CUSTOM_VERSIONS: i32 = -2;

/// Fixed header prologue of a `.uasset` file
#[derive(Debug, Clone, Serialize)]
pub struct PackageHeader {
    pub tag: u32,
    pub legacy_version: i32,
    pub legacy_ue3_version: Option<i32>,
    pub file_version_ue4: i32,
    pub file_version_licensee: i32,
    pub custom_version_count: Option<i32>,
    pub total_header_size: i32,
    pub package_group: String,
    pub package_flags: u32,
    pub names_count: i32,
    pub names_offset: i32,
    pub gatherable_text_count: i32,
    pub gatherable_text_offset: i32,
    pub exports_count: i32,
    pub exports_offset: i32,
}

impl PackageHeader {
    /// Decode and validate the prologue from the start of the reader
    pub fn read(reader: &mut Reader) -> Result<Self> {
        let tag = reader.read_u32()?;
        if tag != PACKAGE_TAG {
            return Err(Error::InvalidTag {
                expected: PACKAGE_TAG,
                actual: tag,
            });
        }

        let legacy_version = reader.read_u32()? as i32;
        let legacy_ue3_version = if legacy_version != LEGACY_VERSION_WITHOUT_UE3 {
            Some(reader.read_i32()?)
        } else {
            None
        };

        let file_version_ue4 = reader.read_i32()?;
        let file_version_licensee = reader.read_i32()?;
        if file_version_ue4 & 0xffff != 0 {
            return Err(Error::UnsupportedVersion {
                field: "file version",
                value: file_version_ue4,
            });
        }
        if file_version_licensee & 0xffff != 0 {
            return Err(Error::UnsupportedVersion {
                field: "licensee version",
                value: file_version_licensee,
            });
        }

        let custom_version_count = if legacy_version <= LEGACY_VERSION_CUSTOM_VERSIONS {
            let count = reader.read_i32()?;
            if count != 0 {
                return Err(Error::UnsupportedCustomVersions(count));
            }
            Some(count)
        } else {
            None
        };

        let total_header_size = reader.read_i32()?;
        let package_group = reader.read_fstring()?;
        let package_flags = reader.read_u32()?;

        let names_count = reader.read_i32()?;
        let names_offset = reader.read_i32()?;
        let gatherable_text_count = reader.read_i32()?;
        let gatherable_text_offset = reader.read_i32()?;
        let exports_count = reader.read_i32()?;
        let exports_offset = reader.read_i32()?;

        if exports_count != 1 {
            return Err(Error::UnsupportedExportCount(exports_count));
        }

        Ok(Self {
            tag,
            legacy_version,
            legacy_ue3_version,
            file_version_ue4,
            file_version_licensee,
            custom_version_count,
            total_header_size,
            package_group,
            package_flags,
            names_count,
            names_offset,
            gatherable_text_count,
            gatherable_text_offset,
            exports_count,
            exports_offset,
        })
    }
}

/// The single export described by the header file
#[derive(Debug, Clone, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExportRecord {
    pub class_index: i32,
    pub super_index: i32,
    pub template_index: i32,
    pub outer_index: i32,
    pub object_name: String,
    pub object_flags: u32,
    pub serial_size: i64,
    pub serial_offset: i64,
    pub forced_export: bool,
    pub not_for_client: bool,
    pub not_for_server: bool,
    pub package_guid: [u8; 16],
    pub package_flags: u32,
    pub not_always_loaded_for_editor_game: bool,
    pub is_asset: bool,
}

impl ExportRecord {
    pub fn read(reader: &mut Reader, names: &NameTable) -> Result<Self> {
        let class_index = reader.read_i32()?;
        let super_index = reader.read_i32()?;
        let template_index = reader.read_i32()?;
        let outer_index = reader.read_i32()?;
        let object_name = reader.read_name(names)?;
        let object_flags = reader.read_u32()?;

        let serial_size = reader.read_i64()?;
        if !is_exact_integer(serial_size) {
            return Err(Error::UnsupportedSize(serial_size));
        }
        let serial_offset = reader.read_i64()?;
        if !is_exact_integer(serial_offset) {
            return Err(Error::UnsupportedOffset(serial_offset));
        }

        Ok(Self {
            class_index,
            super_index,
            template_index,
            outer_index,
            object_name,
            object_flags,
            serial_size,
            serial_offset,
            forced_export: reader.read_bool()?,
            not_for_client: reader.read_bool()?,
            not_for_server: reader.read_bool()?,
            package_guid: reader.read_array()?,
            package_flags: reader.read_u32()?,
            not_always_loaded_for_editor_game: reader.read_bool()?,
            is_asset: reader.read_bool()?,
        })
    }
}

#[inline]
fn is_exact_integer(value: i64) -> bool {
    value.unsigned_abs() <= MAX_EXACT_INTEGER as u64
}

/// Everything decoded from a `.uasset` file
#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub header: PackageHeader,
    pub names: NameTable,
    pub export: ExportRecord,
}

/// Decode a `.uasset` file: prologue, name table, then the export record
pub fn parse_asset(data: &[u8]) -> Result<Asset> {
    let mut reader = Reader::new(data);
    let header = PackageHeader::read(&mut reader)?;
    debug!(
        names = header.names_count,
        exports_offset = header.exports_offset,
        group = %header.package_group,
        "decoded package header"
    );

    let names = read_names(&mut reader, &header)?;

    reader.seek(non_negative("exports offset", header.exports_offset)?)?;
    let export = ExportRecord::read(&mut reader, &names)?;
    debug!(
        object = %export.object_name,
        serial_size = export.serial_size,
        "decoded export record"
    );

    Ok(Asset {
        header,
        names,
        export,
    })
}

fn read_names(reader: &mut Reader, header: &PackageHeader) -> Result<NameTable> {
    let count = non_negative("names count", header.names_count)?;
    reader.seek(non_negative("names offset", header.names_offset)?)?;

    // Each name is at least a length prefix and a hash
    let mut names = Vec::with_capacity(count.min(reader.remaining() / 8));
    for _ in 0..count {
        names.push(reader.read_fstring()?);
        reader.read_bytes(4)?;
    }

    Ok(NameTable::new(names))
}
