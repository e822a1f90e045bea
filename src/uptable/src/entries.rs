//! Entry table decoding with per-field offset tracking
//!
//! The property file is a 10-byte prologue, an entry count, a property count,
//! the schema, then the entries themselves. Every field of every entry is
//! decoded in schema order and the absolute offset it started at is recorded
//! in an [`OffsetMap`]. For array fields the recorded offset is that of the
//! 4-byte length prefix; elements follow at a fixed stride.

use serde::Serialize;
use tracing::debug;

use crate::cursor::Reader;
use crate::property::{decode_element, decode_scalar, PropertyType, Scalar, Value};
use crate::schema::{PropertyDescriptor, Schema};
use crate::{Error, NameTable, Result};

/// Size of the opaque bytes preceding the entry count
pub const PROLOGUE_SIZE: usize = 10;

/// One tagged record, values in schema order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub tag: String,
    pub values: Vec<Value>,
}

impl Entry {
    pub fn value(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }
}

/// Absolute field offsets, indexed by entry then schema position
#[derive(Debug, Clone, Default)]
pub struct OffsetMap {
    offsets: Vec<Vec<usize>>,
}

impl OffsetMap {
    pub fn get(&self, entry: usize, position: usize) -> Option<usize> {
        self.offsets.get(entry)?.get(position).copied()
    }

    /// Offsets of every field in one entry
    pub fn entry(&self, entry: usize) -> Option<&[usize]> {
        self.offsets.get(entry).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// A decoded property file
#[derive(Debug, Clone)]
pub struct PropertyTable {
    prologue: [u8; PROLOGUE_SIZE],
    schema: Schema,
    entries: Vec<Entry>,
    offsets: OffsetMap,
    end: usize,
}

impl PropertyTable {
    /// Decode a property file buffer
    pub fn parse(data: &[u8], names: &NameTable) -> Result<Self> {
        let mut reader = Reader::new(data);
        let prologue = reader.read_array::<PROLOGUE_SIZE>()?;
        let entry_count = reader.read_count("entries count")?;
        let prop_count = reader.read_count("properties count")?;

        let schema = Schema::read(&mut reader, names, prop_count)?;
        debug!(
            entries = entry_count,
            properties = schema.len(),
            "decoded property schema"
        );

        // An entry is at least its tag reference
        let capacity = entry_count.min(reader.remaining() / 8);
        let mut entries = Vec::with_capacity(capacity);
        let mut offsets = Vec::with_capacity(capacity);
        for _ in 0..entry_count {
            let (entry, entry_offsets) = read_entry(&mut reader, &schema, names)?;
            entries.push(entry);
            offsets.push(entry_offsets);
        }

        let end = reader.position();
        debug!(
            end,
            trailing = reader.remaining(),
            "decoded property entries"
        );

        Ok(Self {
            prologue,
            schema,
            entries,
            offsets: OffsetMap { offsets },
            end,
        })
    }

    pub fn prologue(&self) -> &[u8; PROLOGUE_SIZE] {
        &self.prologue
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Result<&Entry> {
        self.entries.get(index).ok_or(Error::EntryIndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    pub fn offsets(&self) -> &OffsetMap {
        &self.offsets
    }

    /// Offset just past the last decoded entry
    pub fn end(&self) -> usize {
        self.end
    }

    /// Value of a named property in one entry
    pub fn value(&self, entry: usize, property: &str) -> Result<&Value> {
        let position = self
            .schema
            .position(property)
            .ok_or_else(|| Error::UnknownField(property.to_string()))?;
        let entry = self.entry(entry)?;
        entry
            .value(position)
            .ok_or_else(|| Error::UnknownField(property.to_string()))
    }

    /// Offset of array element `index`, or `None` if it does not exist
    pub fn element_offset(&self, entry: usize, position: usize, index: usize) -> Option<usize> {
        let descriptor = self.schema.get(position)?;
        let len = self.entries.get(entry)?.value(position)?.as_array()?.len();
        if index >= len {
            return None;
        }
        let stride = descriptor.kind.element_width()?;
        let base = self.offsets.get(entry, position)?;
        Some(base + 4 + index * stride)
    }

    pub(crate) fn set_scalar(&mut self, entry: usize, position: usize, value: Scalar) {
        if let Some(slot) = self
            .entries
            .get_mut(entry)
            .and_then(|e| e.values.get_mut(position))
        {
            *slot = Value::Scalar(value);
        }
    }

    pub(crate) fn set_element(&mut self, entry: usize, position: usize, index: usize, value: Scalar) {
        if let Some(Value::Array(elements)) = self
            .entries
            .get_mut(entry)
            .and_then(|e| e.values.get_mut(position))
        {
            if let Some(slot) = elements.get_mut(index) {
                *slot = value;
            }
        }
    }
}

fn read_entry(
    reader: &mut Reader,
    schema: &Schema,
    names: &NameTable,
) -> Result<(Entry, Vec<usize>)> {
    let tag = reader.read_name(names)?;
    let mut values = Vec::with_capacity(schema.len());
    let mut offsets = Vec::with_capacity(schema.len());

    for descriptor in schema {
        offsets.push(reader.position());
        values.push(read_value(reader, descriptor, names)?);
    }

    Ok((Entry { tag, values }, offsets))
}

fn read_value(
    reader: &mut Reader,
    descriptor: &PropertyDescriptor,
    names: &NameTable,
) -> Result<Value> {
    if !descriptor.is_array() {
        return decode_scalar(reader, descriptor.kind, names).map(Value::Scalar);
    }

    let count = reader.read_count("array length")?;
    let min_width = match descriptor.kind {
        // Length prefix of an empty string
        PropertyType::String => 4,
        kind => kind.element_width().unwrap_or(1),
    };
    let mut elements = Vec::with_capacity(count.min(reader.remaining() / min_width));
    for _ in 0..count {
        elements.push(decode_element(reader, descriptor.kind, names)?);
    }
    Ok(Value::Array(elements))
}
