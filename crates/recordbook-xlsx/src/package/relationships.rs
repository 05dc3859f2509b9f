use roxmltree::Document;

use crate::error::OpenFailure;
use crate::xml::{escape_xml, XML_DECLARATION};

pub const PACKAGE_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub const REL_TYPE_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_TYPE_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub const REL_TYPE_EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
pub const REL_TYPE_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub const REL_TYPE_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub type_: String,
    pub target: String,
}

impl Relationship {
    pub fn new(id: impl Into<String>, type_: &str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_: type_.to_string(),
            target: target.into(),
        }
    }
}

/// A relationships part (`_rels/.rels` or `xl/_rels/workbook.xml.rels`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    pub fn new(items: Vec<Relationship>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    pub fn by_id(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship of `type_`.
    ///
    /// Some producers write the strict-conformance namespace
    /// (`http://purl.oclc.org/ooxml/...`), so the comparison falls back to the final path segment
    /// of the type URI.
    pub fn by_type(&self, type_: &str) -> Option<&Relationship> {
        self.items
            .iter()
            .find(|r| r.type_ == type_)
            .or_else(|| {
                let suffix = type_.rsplit('/').next()?;
                self.items
                    .iter()
                    .find(|r| r.type_.rsplit('/').next() == Some(suffix))
            })
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(XML_DECLARATION);
        xml.push_str(&format!(r#"<Relationships xmlns="{PACKAGE_REL_NS}">"#));
        for rel in &self.items {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                escape_xml(&rel.id),
                escape_xml(&rel.type_),
                escape_xml(&rel.target)
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    pub fn parse(xml: &[u8], part_name: &str) -> Result<Self, OpenFailure> {
        let xml = std::str::from_utf8(xml).map_err(|source| OpenFailure::NonUtf8 {
            part: part_name.to_string(),
            source,
        })?;
        let doc = Document::parse(xml).map_err(|source| OpenFailure::Dom {
            part: part_name.to_string(),
            source,
        })?;

        let mut items = Vec::new();
        for node in doc.descendants().filter(|n| n.is_element()) {
            if node.tag_name().name() != "Relationship" {
                continue;
            }
            let Some(id) = node.attribute("Id") else {
                continue;
            };
            items.push(Relationship {
                id: id.to_string(),
                type_: node.attribute("Type").unwrap_or_default().to_string(),
                target: node.attribute("Target").unwrap_or_default().to_string(),
            });
        }
        Ok(Self { items })
    }
}
