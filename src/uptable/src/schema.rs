//! Property schema: the ordered column set shared by every entry

use serde::Serialize;

use crate::cursor::Reader;
use crate::property::PropertyType;
use crate::{Error, NameTable, Result};

/// Name suffix marking a variable-length array property
pub const ARRAY_SUFFIX: &str = "_Array";

/// One (name, type) column of the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
}

impl PropertyDescriptor {
    pub fn is_array(&self) -> bool {
        self.name.ends_with(ARRAY_SUFFIX)
    }

    /// Decode a name reference followed by a type byte
    pub fn read(reader: &mut Reader, names: &NameTable) -> Result<Self> {
        let name = reader.read_name(names)?;
        let tag = reader.read_u8()?;
        let kind = PropertyType::from_tag(tag).ok_or_else(|| Error::UnknownPropertyType {
            tag,
            property: name.clone(),
        })?;
        Ok(Self { name, kind })
    }
}

/// Property descriptors in file order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Schema {
    props: Vec<PropertyDescriptor>,
}

impl Schema {
    pub fn new(props: Vec<PropertyDescriptor>) -> Self {
        Self { props }
    }

    /// Decode `count` descriptors at the reader's position
    pub fn read(reader: &mut Reader, names: &NameTable, count: usize) -> Result<Self> {
        // A descriptor is a name reference plus a type byte
        let mut props = Vec::with_capacity(count.min(reader.remaining() / 9));
        for _ in 0..count {
            props.push(PropertyDescriptor::read(reader, names)?);
        }
        Ok(Self { props })
    }

    /// Schema position of a property, by exact name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.props.iter().position(|p| p.name == name)
    }

    pub fn get(&self, position: usize) -> Option<&PropertyDescriptor> {
        self.props.get(position)
    }

    /// Look up a property by name together with its position
    pub fn find(&self, name: &str) -> Option<(usize, &PropertyDescriptor)> {
        self.props.iter().enumerate().find(|(_, p)| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyDescriptor> {
        self.props.iter()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a PropertyDescriptor;
    type IntoIter = std::slice::Iter<'a, PropertyDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.props.iter()
    }
}
