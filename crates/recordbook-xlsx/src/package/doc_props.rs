use chrono::{DateTime, SecondsFormat, Utc};

use crate::xml::{escape_xml, XML_DECLARATION};

const CORE_PROPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const EXTENDED_PROPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
const DOC_PROPS_VTYPES_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";

/// `docProps/core.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreProperties {
    pub creator: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl CoreProperties {
    pub fn new(creator: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            creator: creator.into(),
            created: at,
            modified: at,
        }
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(XML_DECLARATION);
        xml.push_str(&format!(
            r#"<cp:coreProperties xmlns:cp="{CORE_PROPS_NS}" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
        ));
        xml.push_str(&format!(
            "<dc:creator>{}</dc:creator>",
            escape_xml(&self.creator)
        ));
        xml.push_str(&format!(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
            w3cdtf(self.created)
        ));
        xml.push_str(&format!(
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>"#,
            w3cdtf(self.modified)
        ));
        xml.push_str("</cp:coreProperties>");
        xml
    }
}

/// `docProps/app.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppProperties {
    pub application: String,
    pub sheet_names: Vec<String>,
}

impl AppProperties {
    pub fn to_xml(&self) -> String {
        let count = self.sheet_names.len();
        let mut xml = String::new();
        xml.push_str(XML_DECLARATION);
        xml.push_str(&format!(
            r#"<Properties xmlns="{EXTENDED_PROPS_NS}" xmlns:vt="{DOC_PROPS_VTYPES_NS}">"#
        ));
        xml.push_str(&format!(
            "<Application>{}</Application>",
            escape_xml(&self.application)
        ));
        xml.push_str("<HeadingPairs>");
        xml.push_str(r#"<vt:vector size="2" baseType="variant">"#);
        xml.push_str("<vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant>");
        xml.push_str(&format!("<vt:variant><vt:i4>{count}</vt:i4></vt:variant>"));
        xml.push_str("</vt:vector>");
        xml.push_str("</HeadingPairs>");
        xml.push_str("<TitlesOfParts>");
        xml.push_str(&format!(r#"<vt:vector size="{count}" baseType="lpstr">"#));
        for name in &self.sheet_names {
            xml.push_str(&format!("<vt:lpstr>{}</vt:lpstr>", escape_xml(name)));
        }
        xml.push_str("</vt:vector>");
        xml.push_str("</TitlesOfParts>");
        xml.push_str("</Properties>");
        xml
    }
}

/// W3CDTF as used by `dcterms:created`: whole seconds, `Z` suffix.
fn w3cdtf(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
