use roxmltree::Document;

use crate::error::OpenFailure;
use crate::xml::{escape_xml, OFFICE_REL_NS, SPREADSHEETML_NS, XML_DECLARATION};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    /// `r:id` of the worksheet relationship in the workbook rels.
    pub rel_id: String,
}

/// The workbook descriptor (`xl/workbook.xml`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookPart {
    pub sheets: Vec<SheetEntry>,
}

impl WorkbookPart {
    pub fn single_sheet(name: &str, rel_id: &str) -> Self {
        Self {
            sheets: vec![SheetEntry {
                name: name.to_string(),
                sheet_id: 1,
                rel_id: rel_id.to_string(),
            }],
        }
    }

    pub fn first_sheet(&self) -> Option<&SheetEntry> {
        self.sheets.first()
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(XML_DECLARATION);
        xml.push_str(&format!(
            r#"<workbook xmlns="{SPREADSHEETML_NS}" xmlns:r="{OFFICE_REL_NS}">"#
        ));
        xml.push_str("<sheets>");
        for sheet in &self.sheets {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="{}"/>"#,
                escape_xml(&sheet.name),
                sheet.sheet_id,
                escape_xml(&sheet.rel_id)
            ));
        }
        xml.push_str("</sheets>");
        xml.push_str("</workbook>");
        xml
    }

    /// Read the `<sheets>` list. The `r:id` attribute is matched by local name so both the
    /// transitional and strict relationship namespaces are accepted.
    pub fn parse(xml: &[u8], part_name: &str) -> Result<Self, OpenFailure> {
        let xml = std::str::from_utf8(xml).map_err(|source| OpenFailure::NonUtf8 {
            part: part_name.to_string(),
            source,
        })?;
        let doc = Document::parse(xml).map_err(|source| OpenFailure::Dom {
            part: part_name.to_string(),
            source,
        })?;

        let mut sheets = Vec::new();
        for node in doc.descendants().filter(|n| n.is_element()) {
            if node.tag_name().name() != "sheet" {
                continue;
            }
            let rel_id = node
                .attributes()
                .find(|a| a.name() == "id" && a.namespace().is_some())
                .map(|a| a.value().to_string());
            let Some(rel_id) = rel_id else {
                continue;
            };
            sheets.push(SheetEntry {
                name: node.attribute("name").unwrap_or_default().to_string(),
                sheet_id: node
                    .attribute("sheetId")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default(),
                rel_id,
            });
        }
        Ok(Self { sheets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sheet_workbook_parses_back() {
        let wb = WorkbookPart::single_sheet("Sheet1", "rId1");
        let xml = wb.to_xml();
        assert!(xml.contains(r#"<sheet name="Sheet1" sheetId="1" r:id="rId1"/>"#));
        assert_eq!(WorkbookPart::parse(xml.as_bytes(), "xl/workbook.xml").unwrap(), wb);
    }

    #[test]
    fn first_sheet_follows_document_order() {
        let xml = br#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
  xmlns:rel="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Data" sheetId="4" rel:id="rId7"/>
    <sheet name="Other" sheetId="2" rel:id="rId3"/>
  </sheets>
</workbook>"#;
        let wb = WorkbookPart::parse(xml, "xl/workbook.xml").unwrap();
        let first = wb.first_sheet().unwrap();
        assert_eq!(first.name, "Data");
        assert_eq!(first.sheet_id, 4);
        assert_eq!(first.rel_id, "rId7");
    }
}
