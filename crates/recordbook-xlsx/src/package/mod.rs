//! Typed representation of the parts that make up a record-table package.
//!
//! Each part kind owns its serializer and, where the reader needs one, its parser. The reader
//! finds parts by following relationships, not by matching substrings of entry names.

pub mod content_types;
pub mod doc_props;
pub mod manifest;
pub mod relationships;
pub mod workbook;

pub use content_types::ContentTypes;
pub use doc_props::{AppProperties, CoreProperties};
pub use manifest::ManifestBuilder;
pub use relationships::{Relationship, Relationships};
pub use workbook::{SheetEntry, WorkbookPart};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";
pub const CORE_PROPS_PART: &str = "docProps/core.xml";
pub const APP_PROPS_PART: &str = "docProps/app.xml";
pub const WORKBOOK_PART: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
pub const WORKSHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Name of the one sheet every written workbook declares.
pub const SHEET_NAME: &str = "Sheet1";

/// The kinds of part a record-table package contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartKind {
    ContentTypes,
    Relationships,
    CoreProperties,
    ExtendedProperties,
    Workbook,
    SharedStrings,
    Worksheet,
}

impl PartKind {
    /// The `Override` content type registered for this kind, if it needs one.
    ///
    /// Relationship parts are covered by the `rels` extension default and the registry itself is
    /// never listed.
    pub fn content_type(self) -> Option<&'static str> {
        match self {
            PartKind::ContentTypes | PartKind::Relationships => None,
            PartKind::CoreProperties => {
                Some("application/vnd.openxmlformats-package.core-properties+xml")
            }
            PartKind::ExtendedProperties => {
                Some("application/vnd.openxmlformats-officedocument.extended-properties+xml")
            }
            PartKind::Workbook => {
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml")
            }
            PartKind::SharedStrings => Some(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml",
            ),
            PartKind::Worksheet => {
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml")
            }
        }
    }
}

/// One serialized part, named by its path inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub kind: PartKind,
    pub xml: String,
}

impl Part {
    pub fn new(name: impl Into<String>, kind: PartKind, xml: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            xml: xml.into(),
        }
    }
}

/// The full set of parts for one write, in archive order: `[Content_Types].xml` first, then every
/// other part by byte-wise name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartSet {
    parts: Vec<Part>,
}

impl PartSet {
    pub fn new(mut parts: Vec<Part>) -> Self {
        parts.sort_by(|a, b| {
            let a_key = (a.name != CONTENT_TYPES_PART, a.name.as_str());
            let b_key = (b.name != CONTENT_TYPES_PART, b.name.as_str());
            a_key.cmp(&b_key)
        });
        Self { parts }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
