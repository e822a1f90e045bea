//! In-place patch writing at recorded offsets
//!
//! An edit is fully validated before any byte is written, so a rejected edit
//! leaves the buffer untouched. Edits earlier in the same batch stay applied.

use tracing::{debug, info};

use crate::cursor::Writer;
use crate::entries::PropertyTable;
use crate::property::{encode_element, encode_scalar, Scalar, Value};
use crate::{Error, NameTable, Result};

/// One field overwrite
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub entry: usize,
    pub property: String,
    /// Element index, required for array properties and forbidden otherwise
    pub index: Option<usize>,
    pub value: Scalar,
}

impl Edit {
    pub fn scalar(entry: usize, property: impl Into<String>, value: Scalar) -> Self {
        Self {
            entry,
            property: property.into(),
            index: None,
            value,
        }
    }

    pub fn element(entry: usize, property: impl Into<String>, index: usize, value: Scalar) -> Self {
        Self {
            entry,
            property: property.into(),
            index: Some(index),
            value,
        }
    }
}

/// Where a validated edit lands
struct Target {
    position: usize,
    offset: usize,
    index: Option<usize>,
}

/// Apply a batch of edits to `data`, in order
///
/// Returns the number of edits applied. Stops at the first rejected edit.
pub fn apply_edits(
    table: &mut PropertyTable,
    names: &NameTable,
    data: &mut [u8],
    edits: &[Edit],
) -> Result<usize> {
    let len = data.len();
    for edit in edits {
        let target = resolve(table, edit)?;
        if let Scalar::Name(name) = &edit.value {
            if !names.contains(name) {
                return Err(Error::InvalidName(name.clone()));
            }
        }

        let mut writer = Writer::new(data);
        writer.seek(target.offset)?;
        match target.index {
            None => encode_scalar(&mut writer, &edit.value, names)?,
            Some(_) => encode_element(&mut writer, &edit.value, names)?,
        }
        debug!(
            entry = edit.entry,
            property = %edit.property,
            index = ?edit.index,
            offset = target.offset,
            value = %edit.value,
            "patched field"
        );

        match target.index {
            None => table.set_scalar(edit.entry, target.position, edit.value.clone()),
            Some(index) => {
                table.set_element(edit.entry, target.position, index, edit.value.clone());
            }
        }
        debug_assert_eq!(data.len(), len);
    }

    info!(edits = edits.len(), "applied edits");
    Ok(edits.len())
}

/// Validate an edit against the table and compute its write offset
fn resolve(table: &PropertyTable, edit: &Edit) -> Result<Target> {
    let (position, descriptor) = table
        .schema()
        .find(&edit.property)
        .ok_or_else(|| Error::UnknownField(edit.property.clone()))?;
    let entry = table.entry(edit.entry)?;

    if !descriptor.kind.is_patchable() {
        return Err(Error::InvalidModification {
            property: edit.property.clone(),
            reason: "string fields cannot be modified in place".to_string(),
        });
    }

    let base = table
        .offsets()
        .get(edit.entry, position)
        .ok_or_else(|| Error::UnknownField(edit.property.clone()))?;

    let offset = match (entry.value(position), edit.index) {
        (Some(Value::Scalar(_)), None) => base,
        (Some(Value::Array(elements)), Some(index)) => {
            if index >= elements.len() {
                return Err(Error::ArrayIndexOutOfRange {
                    entry: edit.entry,
                    property: edit.property.clone(),
                    index,
                    len: elements.len(),
                });
            }
            table
                .element_offset(edit.entry, position, index)
                .ok_or_else(|| Error::ArrayIndexOutOfRange {
                    entry: edit.entry,
                    property: edit.property.clone(),
                    index,
                    len: elements.len(),
                })?
        }
        (Some(Value::Scalar(_)), Some(_)) => {
            return Err(Error::InvalidModification {
                property: edit.property.clone(),
                reason: "array index given for a scalar field".to_string(),
            })
        }
        (Some(Value::Array(_)), None) => {
            return Err(Error::InvalidModification {
                property: edit.property.clone(),
                reason: "array field requires an element index".to_string(),
            })
        }
        (None, _) => return Err(Error::UnknownField(edit.property.clone())),
    };

    if edit.value.kind() != descriptor.kind {
        return Err(Error::ValueTypeMismatch {
            property: edit.property.clone(),
            expected: descriptor.kind,
            actual: edit.value.kind(),
        });
    }

    Ok(Target {
        position,
        offset,
        index: edit.index,
    })
}
