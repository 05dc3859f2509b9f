use roxmltree::Document;

use super::{Part, PartKind};
use crate::error::OpenFailure;
use crate::xml::{escape_xml, XML_DECLARATION};

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const DEFAULT_RELS: (&str, &str) = (
    "rels",
    "application/vnd.openxmlformats-package.relationships+xml",
);
const DEFAULT_XML: (&str, &str) = ("xml", "application/xml");

/// The content-type registry (`[Content_Types].xml`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// `(extension, content type)` pairs.
    pub defaults: Vec<(String, String)>,
    /// `(part name with leading '/', content type)` pairs.
    pub overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Registry covering `parts`: the `rels`/`xml` defaults plus one override per part whose kind
    /// carries a content type.
    pub fn for_parts<'a>(parts: impl IntoIterator<Item = (&'a str, PartKind)>) -> Self {
        let defaults = [DEFAULT_RELS, DEFAULT_XML]
            .iter()
            .map(|(ext, ct)| (ext.to_string(), ct.to_string()))
            .collect();
        let overrides = parts
            .into_iter()
            .filter_map(|(name, kind)| {
                kind.content_type()
                    .map(|ct| (format!("/{name}"), ct.to_string()))
            })
            .collect();
        Self {
            defaults,
            overrides,
        }
    }

    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        let wanted = part_name.trim_start_matches('/');
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(name, _)| name.trim_start_matches('/').eq_ignore_ascii_case(wanted))
        {
            return Some(ct.as_str());
        }
        let ext = wanted.rsplit_once('.').map(|(_, ext)| ext)?;
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, ct)| ct.as_str())
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(XML_DECLARATION);
        xml.push_str(&format!(r#"<Types xmlns="{CONTENT_TYPES_NS}">"#));
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ct)
            ));
        }
        for (name, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(name),
                escape_xml(ct)
            ));
        }
        xml.push_str("</Types>");
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

        let mut out = ContentTypes::default();
        for node in doc.descendants().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "Default" => {
                    if let (Some(ext), Some(ct)) =
                        (node.attribute("Extension"), node.attribute("ContentType"))
                    {
                        out.defaults.push((ext.to_string(), ct.to_string()));
                    }
                }
                "Override" => {
                    if let (Some(name), Some(ct)) =
                        (node.attribute("PartName"), node.attribute("ContentType"))
                    {
                        out.overrides.push((name.to_string(), ct.to_string()));
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }

    pub(crate) fn into_part(self) -> Part {
        Part::new(super::CONTENT_TYPES_PART, PartKind::ContentTypes, self.to_xml())
    }
}
