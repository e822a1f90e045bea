//! Minimal package pair for command tests

use std::fs;
use std::path::{Path, PathBuf};

const NAMES: &[&str] = &[
    "None",
    "MyTable",
    "Row_A",
    "Row_B",
    "Hp",
    "Kind",
    "Label",
    "Drops_Array",
    "Fire",
    "Ice",
];

fn index(name: &str) -> i32 {
    NAMES
        .iter()
        .position(|n| *n == name)
        .unwrap_or_else(|| panic!("fixture name {name} missing")) as i32
}

struct Bytes(Vec<u8>);

impl Bytes {
    fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i64(&mut self, v: i64) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn raw(&mut self, v: &[u8]) -> &mut Self {
        self.0.extend_from_slice(v);
        self
    }

    fn fstring(&mut self, v: &str) -> &mut Self {
        self.i32(v.len() as i32 + 1).raw(v.as_bytes()).raw(&[0])
    }

    fn name(&mut self, v: &str) -> &mut Self {
        self.i32(index(v)).i32(0)
    }

    fn patch(&mut self, at: usize, v: i32) {
        self.0[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }
}

/// Property file: Hp (Int32), Kind (Name), Label (String), Drops_Array (Int32)
pub(crate) fn uexp() -> Vec<u8> {
    let mut b = Bytes((0..10).collect());
    b.i32(2).i32(4);
    b.name("Hp").raw(&[7]);
    b.name("Kind").raw(&[11]);
    b.name("Label").raw(&[10]);
    b.name("Drops_Array").raw(&[7]);

    b.name("Row_A").i32(100).name("Fire").fstring("Sword");
    b.i32(2).i32(1).i32(2);
    b.name("Row_B").i32(5).name("Ice").fstring("");
    b.i32(0);

    b.raw(&0x9E2A_83C1u32.to_le_bytes());
    b.0
}

pub(crate) fn uasset(serial_size: i64) -> Vec<u8> {
    let mut b = Bytes(Vec::new());
    b.raw(&0x9E2A_83C1u32.to_le_bytes());
    b.i32(-7).i32(864).i32(0).i32(0).i32(0);
    let header_size_at = b.0.len();
    b.i32(0).fstring("None").i32(0);

    b.i32(NAMES.len() as i32);
    let names_offset_at = b.0.len();
    b.i32(0).i32(0).i32(0).i32(1);
    let exports_offset_at = b.0.len();
    b.i32(0);

    let names_offset = b.0.len() as i32;
    for name in NAMES {
        b.fstring(name).i32(0);
    }

    let exports_offset = b.0.len() as i32;
    b.i32(-3).i32(0).i32(-4).i32(0).name("MyTable").i32(0);
    b.i64(serial_size).i64(0x400);
    b.raw(&[0, 0, 0]).raw(&[0; 16]).i32(0).raw(&[0, 1]);

    let len = b.0.len() as i32;
    b.patch(header_size_at, len);
    b.patch(names_offset_at, names_offset);
    b.patch(exports_offset_at, exports_offset);
    b.0
}

/// Write `<stem>.uasset` and `<stem>.uexp` into `dir`, returning the header path
pub(crate) fn write_package(dir: &Path, stem: &str) -> PathBuf {
    let table = uexp();
    let asset = uasset(table.len() as i64 - 4);
    let asset_path = dir.join(format!("{stem}.uasset"));
    fs::write(&asset_path, asset).unwrap();
    fs::write(dir.join(format!("{stem}.uexp")), table).unwrap();
    asset_path
}
