use crate::xml::{escape_xml, needs_space_preserve, XML_DECLARATION};

use super::SharedStrings;

/// Serialize `shared` as `xl/sharedStrings.xml`.
///
/// `count` and `uniqueCount` both equal the number of items: the writer references each distinct
/// value from at least one cell and keeps no duplicates.
pub fn write_shared_strings_xml(shared: &SharedStrings) -> String {
    let count = shared.len();
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{count}" uniqueCount="{count}">"#
    ));
    for item in shared.items() {
        if needs_space_preserve(item) {
            out.push_str(r#"<si><t xml:space="preserve">"#);
        } else {
            out.push_str("<si><t>");
        }
        out.push_str(&escape_xml(item));
        out.push_str("</t></si>");
    }
    out.push_str("</sst>");
    out
}
