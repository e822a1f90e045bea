//! Package name table
//!
//! Every name reference in a package is an index into this table. The table
//! is decoded once from the header file and never modified.

use std::collections::HashMap;

use serde::Serialize;

use crate::{Error, Result};

/// Ordered, index-addressable set of names in file order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NameTable {
    names: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, u32>,
}

impl NameTable {
    pub fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // First occurrence wins for duplicated names
            index.entry(name.clone()).or_insert(i as u32);
        }
        Self { names, index }
    }

    /// Resolve a serialized name index
    pub fn get(&self, index: i32) -> Result<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
            .ok_or(Error::NameIndexOutOfRange {
                index,
                len: self.names.len(),
            })
    }

    /// Find the index of a name by exact match
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }
}
