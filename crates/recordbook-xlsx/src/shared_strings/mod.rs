pub(crate) mod parse;
mod write;

use std::collections::HashMap;

pub use parse::parse_shared_strings_xml;
pub use parse::SharedStringsError;
pub use write::write_shared_strings_xml;

/// Write-side shared strings table: registers distinct values during one worksheet build.
///
/// Ordinals returned by [`SharedStringTable::add`] are registration handles, stable for the
/// lifetime of the table. The ordinals stored on disk come from [`SharedStringTable::sorted`],
/// whose order is ascending byte-wise order of the values so equivalent input always serializes
/// identically.
#[derive(Clone, Debug, Default)]
pub struct SharedStringTable {
    values: Vec<String>,
    index: HashMap<String, u32>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` once; equal values return the same ordinal.
    pub fn add(&mut self, value: &str) -> u32 {
        if let Some(idx) = self.index.get(value) {
            return *idx;
        }
        let idx = self.values.len() as u32;
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The registered values in serialization order.
    pub fn to_ordered_list(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.values.iter().map(String::as_str).collect();
        out.sort_unstable();
        out
    }

    /// Freeze into the canonical, serialization-ordered table.
    pub fn sorted(&self) -> SharedStrings {
        SharedStrings::from_items(self.to_ordered_list().into_iter().map(str::to_string).collect())
    }
}

/// Shared strings table (`xl/sharedStrings.xml`) indexed by on-disk ordinal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharedStrings {
    items: Vec<String>,
    index: HashMap<String, u32>,
}

impl SharedStrings {
    /// Build a table whose ordinals are the positions in `items`.
    ///
    /// Duplicate items (possible in third-party files) keep their own ordinal for lookup; reverse
    /// lookup resolves to the first occurrence.
    pub fn from_items(items: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            index.entry(item.clone()).or_insert(idx as u32);
        }
        Self { items, index }
    }

    pub fn lookup(&self, ordinal: u32) -> Option<&str> {
        self.items.get(ordinal as usize).map(String::as_str)
    }

    pub fn ordinal_of(&self, value: &str) -> Option<u32> {
        self.index.get(value).copied()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
