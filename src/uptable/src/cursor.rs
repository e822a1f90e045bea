//! Positioned little-endian reading and writing over in-memory buffers
//!
//! [`Reader`] borrows the buffer immutably for a decode pass, [`Writer`]
//! borrows it mutably for a patch pass. Both check the full width of an
//! access before touching the buffer or moving the position, so a failed
//! access leaves the cursor (and for writes, the bytes) unchanged.

use byteorder::{ByteOrder, LE};

use crate::{Error, NameTable, Result};

/// Width of a serialized name reference: table index + discarded number
pub const NAME_REF_SIZE: usize = 8;

/// Resolve `size` bytes at `offset`, or report the overrun
#[inline]
fn span(offset: usize, size: usize, len: usize) -> Result<std::ops::Range<usize>> {
    offset
        .checked_add(size)
        .filter(|&end| end <= len)
        .map(|end| offset..end)
        .ok_or(Error::OutOfBounds { offset, size, len })
}

/// Convert a serialized count or offset, rejecting negative values
pub(crate) fn non_negative(field: &'static str, value: i32) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::InvalidCount {
        field,
        value: i64::from(value),
    })
}

/// Byte reader for decoding packed little-endian data
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position in bytes
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the position and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move to an absolute position (the end of the buffer is allowed)
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        span(pos, 0, self.data.len())?;
        self.pos = pos;
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = self.data;
        let range = span(self.pos, n, data.len())?;
        self.pos = range.end;
        Ok(&data[range])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a one-byte boolean (any nonzero byte is true)
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LE::read_i16(self.take(2)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LE::read_i32(self.take(4)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LE::read_u32(self.take(4)?))
    }

    /// Read an `i32` count, rejecting negative values
    pub fn read_count(&mut self, field: &'static str) -> Result<usize> {
        let value = self.read_i32()?;
        non_negative(field, value)
    }

    /// Read a signed 64-bit value; range checks are the caller's job
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(LE::read_i64(self.take(8)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LE::read_f32(self.take(4)?))
    }

    /// Read a length-prefixed string
    ///
    /// A positive length counts single-byte characters, a negative length
    /// counts UTF-16LE code units. One trailing NUL is stripped.
    pub fn read_fstring(&mut self) -> Result<String> {
        let start = self.pos;
        let result = self.read_fstring_at_position();
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    fn read_fstring_at_position(&mut self) -> Result<String> {
        let len = self.read_i32()?;

        let mut value = if len >= 0 {
            String::from_utf8_lossy(self.take(len as usize)?).into_owned()
        } else {
            let units = len.unsigned_abs() as usize;
            let size = units.checked_mul(2).ok_or(Error::OutOfBounds {
                offset: self.pos,
                size: usize::MAX,
                len: self.data.len(),
            })?;
            let code_units: Vec<u16> = self.take(size)?.chunks_exact(2).map(LE::read_u16).collect();
            String::from_utf16_lossy(&code_units)
        };

        if value.ends_with('\0') {
            value.pop();
        }
        Ok(value)
    }

    /// Read a name reference without resolving it
    pub fn read_name_index(&mut self) -> Result<i32> {
        let bytes = self.take(NAME_REF_SIZE)?;
        Ok(LE::read_i32(&bytes[..4]))
    }

    /// Read a name reference and resolve it through the name table
    pub fn read_name(&mut self, names: &NameTable) -> Result<String> {
        let index = self.read_name_index()?;
        names.get(index).map(str::to_owned)
    }
}

/// Byte writer for patching fixed-width values into an existing buffer
///
/// Never grows or shrinks the buffer.
pub struct Writer<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        span(pos, 0, self.data.len())?;
        self.pos = pos;
        Ok(())
    }

    /// Advance without writing
    pub fn skip(&mut self, n: usize) -> Result<()> {
        let range = span(self.pos, n, self.data.len())?;
        self.pos = range.end;
        Ok(())
    }

    fn slot(&mut self, n: usize) -> Result<&mut [u8]> {
        let range = span(self.pos, n, self.data.len())?;
        self.pos = range.end;
        Ok(&mut self.data[range])
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.slot(1)?[0] = value;
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        LE::write_i16(self.slot(2)?, value);
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        LE::write_i32(self.slot(4)?, value);
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        LE::write_f32(self.slot(4)?, value);
        Ok(())
    }

    /// Write a name reference: table index followed by a zero number
    pub fn write_name_index(&mut self, index: u32) -> Result<()> {
        let slot = self.slot(NAME_REF_SIZE)?;
        LE::write_u32(&mut slot[..4], index);
        slot[4..].fill(0);
        Ok(())
    }
}
