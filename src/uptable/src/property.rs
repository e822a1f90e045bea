//! Property kinds and their on-disk encodings
//!
//! Decode and encode share the width tables below. Patch writes locate array
//! elements by stride arithmetic, so [`PropertyType::element_width`] must
//! match what [`decode_element`] consumes exactly.
//!
//! Boolean is the one kind whose width depends on context: 4 bytes as a
//! scalar field, 1 byte as an array element. Existing files are laid out
//! that way and are decoded as found.

use std::fmt;

use serde::Serialize;

use crate::cursor::{Reader, Writer, NAME_REF_SIZE};
use crate::{Error, NameTable, Result};

/// Closed set of property type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum PropertyType {
    Boolean = 1,
    Byte = 2,
    BooleanByte = 3,
    UInt16 = 4,
    Int32 = 7,
    Float = 9,
    String = 10,
    Name = 11,
}

impl PropertyType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Boolean),
            2 => Some(Self::Byte),
            3 => Some(Self::BooleanByte),
            4 => Some(Self::UInt16),
            7 => Some(Self::Int32),
            9 => Some(Self::Float),
            10 => Some(Self::String),
            11 => Some(Self::Name),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::BooleanByte => "BooleanByte",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::Float => "Float",
            Self::String => "String",
            Self::Name => "Name",
        }
    }

    /// Encoded width of a scalar field, `None` for variable-length strings
    pub fn scalar_width(self) -> Option<usize> {
        match self {
            Self::Boolean | Self::Int32 | Self::Float => Some(4),
            Self::Byte | Self::BooleanByte => Some(1),
            Self::UInt16 => Some(2),
            Self::Name => Some(NAME_REF_SIZE),
            Self::String => None,
        }
    }

    /// Stride between consecutive array elements
    pub fn element_width(self) -> Option<usize> {
        match self {
            Self::Boolean | Self::Byte | Self::BooleanByte => Some(1),
            Self::UInt16 => Some(2),
            Self::Int32 | Self::Float => Some(4),
            Self::Name => Some(NAME_REF_SIZE),
            Self::String => None,
        }
    }

    /// Whether values of this kind can be overwritten in place
    pub fn is_patchable(self) -> bool {
        self != Self::String
    }

    /// Whether cells of this kind hold numbers
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::String | Self::Name)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded field value
///
/// `Boolean` keeps the raw integer so unmodified values re-encode to the
/// exact original bytes.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(i32),
    Byte(u8),
    BooleanByte(u8),
    UInt16(i16),
    Int32(i32),
    Float(f32),
    String(String),
    Name(String),
}

impl Scalar {
    pub fn kind(&self) -> PropertyType {
        match self {
            Self::Boolean(_) => PropertyType::Boolean,
            Self::Byte(_) => PropertyType::Byte,
            Self::BooleanByte(_) => PropertyType::BooleanByte,
            Self::UInt16(_) => PropertyType::UInt16,
            Self::Int32(_) => PropertyType::Int32,
            Self::Float(_) => PropertyType::Float,
            Self::String(_) => PropertyType::String,
            Self::Name(_) => PropertyType::Name,
        }
    }

    /// Text content of string and name values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Parse user-supplied text as a value of `kind`
    ///
    /// Integer kinds are range-checked against their encoded width. String and
    /// name text is taken verbatim.
    pub fn parse(kind: PropertyType, raw: &str) -> Result<Self> {
        let text = raw.trim();
        let invalid = |reason: &str| Error::InvalidValue {
            kind,
            value: text.to_string(),
            reason: reason.to_string(),
        };

        match kind {
            PropertyType::Boolean => match parse_flag(text) {
                Some(flag) => Ok(Self::Boolean(i32::from(flag))),
                None => parse_int(text, i64::from(i32::MIN), i64::from(i32::MAX))
                    .map(|v| Self::Boolean(v as i32))
                    .ok_or_else(|| invalid("value must be true, false or a 32-bit integer")),
            },
            PropertyType::Byte => parse_int(text, 0, 255)
                .map(|v| Self::Byte(v as u8))
                .ok_or_else(|| invalid("value must be between 0 and 255")),
            PropertyType::BooleanByte => match parse_flag(text) {
                Some(flag) => Ok(Self::BooleanByte(u8::from(flag))),
                None => parse_int(text, 0, 255)
                    .map(|v| Self::BooleanByte(v as u8))
                    .ok_or_else(|| invalid("value must be between 0 and 255")),
            },
            PropertyType::UInt16 => parse_int(text, i64::from(i16::MIN), i64::from(i16::MAX))
                .map(|v| Self::UInt16(v as i16))
                .ok_or_else(|| invalid("value must be between -32768 and 32767")),
            PropertyType::Int32 => parse_int(text, i64::from(i32::MIN), i64::from(i32::MAX))
                .map(|v| Self::Int32(v as i32))
                .ok_or_else(|| invalid("value must be between -2147483648 and 2147483647")),
            PropertyType::Float => text
                .parse::<f32>()
                .map(Self::Float)
                .map_err(|_| invalid("value must be a number")),
            PropertyType::String => Ok(Self::String(raw.to_string())),
            PropertyType::Name => Ok(Self::Name(raw.to_string())),
        }
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_int(text: &str, min: i64, max: i64) -> Option<i64> {
    text.parse::<i64>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) | (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) | (Self::BooleanByte(a), Self::BooleanByte(b)) => {
                a == b
            }
            (Self::UInt16(a), Self::UInt16(b)) => a == b,
            // Bitwise, so NaN payloads compare equal to themselves
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) | (Self::Name(a), Self::Name(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) | Self::Int32(v) => write!(f, "{}", v),
            Self::Byte(v) | Self::BooleanByte(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) | Self::Name(s) => f.write_str(s),
        }
    }
}

/// A field value: one scalar, or a variable-length array of scalars
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            Self::Array(elements) => Some(elements),
            Self::Scalar(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => s.fmt(f),
            Self::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    element.fmt(f)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Where a value sits, which decides the Boolean width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Field,
    Element,
}

/// Decode one scalar field
pub fn decode_scalar(reader: &mut Reader, kind: PropertyType, names: &NameTable) -> Result<Scalar> {
    decode(reader, kind, names, Slot::Field)
}

/// Decode one array element
pub fn decode_element(reader: &mut Reader, kind: PropertyType, names: &NameTable) -> Result<Scalar> {
    decode(reader, kind, names, Slot::Element)
}

fn decode(reader: &mut Reader, kind: PropertyType, names: &NameTable, slot: Slot) -> Result<Scalar> {
    Ok(match kind {
        PropertyType::Boolean => match slot {
            Slot::Field => Scalar::Boolean(reader.read_i32()?),
            Slot::Element => Scalar::Boolean(i32::from(reader.read_u8()?)),
        },
        PropertyType::Byte => Scalar::Byte(reader.read_u8()?),
        PropertyType::BooleanByte => Scalar::BooleanByte(reader.read_u8()?),
        PropertyType::UInt16 => Scalar::UInt16(reader.read_i16()?),
        PropertyType::Int32 => Scalar::Int32(reader.read_i32()?),
        PropertyType::Float => Scalar::Float(reader.read_f32()?),
        PropertyType::String => Scalar::String(reader.read_fstring()?),
        PropertyType::Name => Scalar::Name(reader.read_name(names)?),
    })
}

/// Encode a scalar field at the writer's position
pub fn encode_scalar(writer: &mut Writer, value: &Scalar, names: &NameTable) -> Result<()> {
    encode(writer, value, names, Slot::Field)
}

/// Encode an array element at the writer's position
pub fn encode_element(writer: &mut Writer, value: &Scalar, names: &NameTable) -> Result<()> {
    encode(writer, value, names, Slot::Element)
}

fn encode(writer: &mut Writer, value: &Scalar, names: &NameTable, slot: Slot) -> Result<()> {
    match value {
        Scalar::Boolean(v) => match slot {
            Slot::Field => writer.write_i32(*v),
            Slot::Element => {
                let byte = u8::try_from(*v).map_err(|_| Error::InvalidValue {
                    kind: PropertyType::Boolean,
                    value: v.to_string(),
                    reason: "array element must be between 0 and 255".to_string(),
                })?;
                writer.write_u8(byte)
            }
        },
        Scalar::Int32(v) => writer.write_i32(*v),
        Scalar::Byte(v) | Scalar::BooleanByte(v) => writer.write_u8(*v),
        Scalar::UInt16(v) => writer.write_i16(*v),
        Scalar::Float(v) => writer.write_f32(*v),
        Scalar::Name(name) => {
            let index = names
                .index_of(name)
                .ok_or_else(|| Error::InvalidName(name.clone()))?;
            writer.write_name_index(index)
        }
        Scalar::String(s) => Err(Error::InvalidValue {
            kind: PropertyType::String,
            value: s.clone(),
            reason: "strings cannot be written in place".to_string(),
        }),
    }
}
