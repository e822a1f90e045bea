//! Synthetic package images for unit tests

use crate::header::PACKAGE_TAG;

pub(crate) const NAMES: &[&str] = &[
    "None",
    "MyTable",
    "Row_A",
    "Row_B",
    "Hp",
    "Speed",
    "Alive",
    "Level",
    "Grade",
    "Enabled",
    "Label",
    "Kind",
    "Drops_Array",
    "Flags_Array",
    "Kinds_Array",
    "Small_Array",
    "Titles_Array",
    "Fire",
    "Ice",
];

/// Index of a fixture name
pub(crate) fn name_index(name: &str) -> i32 {
    NAMES
        .iter()
        .position(|n| *n == name)
        .unwrap_or_else(|| panic!("fixture name {name} missing")) as i32
}

fn put_fstring(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(&(value.len() as i32 + 1).to_le_bytes());
    buf.extend_from_slice(value.as_bytes());
    buf.push(0);
}

fn put_utf16(buf: &mut Vec<u8>, value: &str) {
    let units: Vec<u16> = value.encode_utf16().collect();
    buf.extend_from_slice(&(-(units.len() as i32 + 1)).to_le_bytes());
    for unit in units {
        buf.extend_from_slice(&unit.to_le_bytes());
    }
    buf.extend_from_slice(&[0, 0]);
}

fn patch_i32(buf: &mut [u8], at: usize, value: usize) {
    buf[at..at + 4].copy_from_slice(&(value as i32).to_le_bytes());
}

/// Header file builder with knobs for every validated field
pub(crate) struct AssetBuilder {
    pub tag: u32,
    pub legacy_version: i32,
    pub file_version: i32,
    pub licensee_version: i32,
    pub custom_versions: i32,
    pub export_count: i32,
    pub serial_size: i64,
    pub serial_offset: i64,
    pub names: Vec<String>,
}

impl Default for AssetBuilder {
    fn default() -> Self {
        Self {
            tag: PACKAGE_TAG,
            legacy_version: -7,
            file_version: 0,
            licensee_version: 0,
            custom_versions: 0,
            export_count: 1,
            serial_size: 0,
            serial_offset: 0,
            names: NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AssetBuilder {
    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.tag.to_le_bytes());
        buf.extend_from_slice(&self.legacy_version.to_le_bytes());
        if self.legacy_version != -4 {
            buf.extend_from_slice(&864i32.to_le_bytes());
        }
        buf.extend_from_slice(&self.file_version.to_le_bytes());
        buf.extend_from_slice(&self.licensee_version.to_le_bytes());
        if self.legacy_version <= -2 {
            buf.extend_from_slice(&self.custom_versions.to_le_bytes());
        }

        let header_size_at = buf.len();
        buf.extend_from_slice(&0i32.to_le_bytes());
        put_fstring(&mut buf, "None");
        buf.extend_from_slice(&0x8000_0000u32.to_le_bytes());

        buf.extend_from_slice(&(self.names.len() as i32).to_le_bytes());
        let names_offset_at = buf.len();
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&self.export_count.to_le_bytes());
        let exports_offset_at = buf.len();
        buf.extend_from_slice(&0i32.to_le_bytes());

        // Unread summary fields
        buf.extend_from_slice(&[0u8; 16]);

        let names_offset = buf.len();
        for name in &self.names {
            put_fstring(&mut buf, name);
            buf.extend_from_slice(&0xdead_beefu32.to_le_bytes());
        }

        let exports_offset = buf.len();
        buf.extend_from_slice(&(-3i32).to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&(-4i32).to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&name_index("MyTable").to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0x0000_0009u32.to_le_bytes());
        buf.extend_from_slice(&self.serial_size.to_le_bytes());
        buf.extend_from_slice(&self.serial_offset.to_le_bytes());
        buf.extend_from_slice(&[0, 1, 0]);
        buf.extend_from_slice(&[0x11; 16]);
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf.extend_from_slice(&[0, 1]);

        patch_i32(&mut buf, names_offset_at, names_offset);
        patch_i32(&mut buf, exports_offset_at, exports_offset);
        let len = buf.len();
        patch_i32(&mut buf, header_size_at, len);
        buf
    }
}

/// Property file builder; fields are appended in call order
pub(crate) struct TableBuilder {
    buf: Vec<u8>,
}

impl TableBuilder {
    pub fn new(entry_count: i32, props: &[(&str, u8)]) -> Self {
        let mut buf: Vec<u8> = (1..=10).collect();
        buf.extend_from_slice(&entry_count.to_le_bytes());
        buf.extend_from_slice(&(props.len() as i32).to_le_bytes());
        let mut builder = Self { buf };
        for (name, tag) in props {
            builder = builder.name(name).u8(*tag);
        }
        builder
    }

    pub fn name(mut self, name: &str) -> Self {
        self.buf.extend_from_slice(&name_index(name).to_le_bytes());
        self.buf.extend_from_slice(&0u32.to_le_bytes());
        self
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.buf.push(value);
        self
    }

    pub fn i16(mut self, value: i16) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32(mut self, value: f32) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn fstring(mut self, value: &str) -> Self {
        put_fstring(&mut self.buf, value);
        self
    }

    pub fn utf16(mut self, value: &str) -> Self {
        put_utf16(&mut self.buf, value);
        self
    }

    /// Trailing package tag, as found at the end of real property files
    pub fn footer(mut self) -> Self {
        self.buf.extend_from_slice(&PACKAGE_TAG.to_le_bytes());
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// Schema shared by the sample table, deliberately not alphabetical
pub(crate) const SAMPLE_PROPS: &[(&str, u8)] = &[
    ("Hp", 7),
    ("Speed", 9),
    ("Alive", 1),
    ("Level", 4),
    ("Grade", 2),
    ("Enabled", 3),
    ("Label", 10),
    ("Kind", 11),
    ("Drops_Array", 7),
    ("Flags_Array", 1),
    ("Kinds_Array", 11),
    ("Small_Array", 4),
    ("Titles_Array", 10),
];

// Absolute offsets in the sample table (entry 0 starts at 135)
pub(crate) const ROW_A_HP: usize = 143;
pub(crate) const ROW_A_SPEED: usize = 147;
pub(crate) const ROW_A_ALIVE: usize = 151;
pub(crate) const ROW_A_LEVEL: usize = 155;
pub(crate) const ROW_A_GRADE: usize = 157;
pub(crate) const ROW_A_LABEL: usize = 159;
pub(crate) const ROW_A_KIND: usize = 169;
pub(crate) const ROW_A_DROPS: usize = 177;
pub(crate) const ROW_A_FLAGS: usize = 193;
pub(crate) const ROW_A_KINDS: usize = 199;
pub(crate) const ROW_A_SMALL: usize = 219;
pub(crate) const ROW_B_START: usize = 237;

/// Two-entry property table covering every kind, scalar and array
pub(crate) fn sample_table() -> Vec<u8> {
    TableBuilder::new(2, SAMPLE_PROPS)
        // Row_A
        .name("Row_A")
        .i32(100)
        .f32(1.5)
        .i32(1)
        .i16(300)
        .u8(7)
        .u8(1)
        .fstring("Sword")
        .name("Fire")
        .i32(3)
        .i32(10)
        .i32(20)
        .i32(30)
        .i32(2)
        .u8(1)
        .u8(0)
        .i32(2)
        .name("Fire")
        .name("Ice")
        .i32(2)
        .i16(5)
        .i16(-1)
        .i32(1)
        .fstring("a")
        // Row_B
        .name("Row_B")
        .i32(-5)
        .f32(0.25)
        .i32(0)
        .i16(0)
        .u8(255)
        .u8(0)
        .utf16("\u{3042}\u{3044}")
        .name("None")
        .i32(0)
        .i32(3)
        .u8(1)
        .u8(1)
        .u8(1)
        .i32(0)
        .i32(0)
        .i32(0)
        .footer()
        .build()
}

/// Header and property file images for the sample package
pub(crate) fn sample_package() -> (Vec<u8>, Vec<u8>) {
    let table = sample_table();
    let asset = AssetBuilder {
        serial_size: table.len() as i64 - 4,
        serial_offset: 0x200,
        ..AssetBuilder::default()
    }
    .build();
    (asset, table)
}
