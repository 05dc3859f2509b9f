//! The single worksheet part (`xl/worksheets/sheet1.xml`).

mod parse;

pub use parse::{parse_worksheet_rows, WorksheetError};

use crate::cell_ref::{CellRef, CellRefError, MAX_ROWS};
use crate::options::WriteOptions;
use crate::shared_strings::{SharedStringTable, SharedStrings};
use crate::value::{CellValue, StoredValue};
use crate::xml::{
    escape_xml, needs_space_preserve, xml_legal_text, OFFICE_REL_NS, SPREADSHEETML_NS,
    XML_DECLARATION,
};

/// One serialized cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CellXml {
    /// `<c r=".."/>`
    Blank,
    /// `<c r=".." t="inlineStr"><is><t>..</t></is></c>`
    InlineString(String),
    /// `<c r=".." t="s"><v>ordinal</v></c>`
    SharedString(u32),
    /// `<c r=".."><v>literal</v></c>`
    Number(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct WorksheetRow {
    pub(crate) index: u32,
    pub(crate) cells: Vec<(CellRef, CellXml)>,
}

/// Typed representation of the worksheet part.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Worksheet {
    rows: Vec<WorksheetRow>,
}

impl Worksheet {
    /// Build the worksheet for one record table.
    ///
    /// Row 1 holds `headers` as inline strings; every data row follows in order, one cell per
    /// supplied value. Text values are classified with the column's [`crate::ValueMode`]; values
    /// stored as strings are registered in `strings`. Returns the worksheet together with the
    /// canonical shared strings table its cells reference.
    pub fn build(
        headers: &[String],
        rows: &[Vec<CellValue>],
        options: &WriteOptions,
        strings: &mut SharedStringTable,
    ) -> Result<(Worksheet, SharedStrings), CellRefError> {
        let last_row = u32::try_from(rows.len())
            .ok()
            .and_then(|n| n.checked_add(1))
            .filter(|n| *n <= MAX_ROWS)
            .ok_or(CellRefError::RowOutOfRange(u32::MAX))?;
        log::debug!(
            "building worksheet: {} columns, {} data rows (last row {last_row})",
            headers.len(),
            rows.len()
        );

        // Pass 1: classify every cell and register string values.
        let classified: Vec<Vec<StoredValue>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(idx, value)| {
                        let mode = options.mode_for(headers.get(idx).map(String::as_str));
                        let stored = value.classify(mode);
                        if let StoredValue::Shared(text) = &stored {
                            strings.add(text);
                        }
                        stored
                    })
                    .collect()
            })
            .collect();

        // Pass 2: emit cells against the canonical (sorted) ordinals.
        let shared = strings.sorted();
        let mut out = Vec::with_capacity(rows.len() + 1);

        let mut header_cells = Vec::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            let cell = CellRef::new(1, column_number(idx)?)?;
            let text = xml_legal_text(header).into_owned();
            header_cells.push((cell, CellXml::InlineString(text)));
        }
        out.push(WorksheetRow {
            index: 1,
            cells: header_cells,
        });

        for (row_idx, row) in classified.into_iter().enumerate() {
            let index = row_idx as u32 + 2;
            let mut cells = Vec::with_capacity(row.len());
            for (col_idx, stored) in row.into_iter().enumerate() {
                let cell = CellRef::new(index, column_number(col_idx)?)?;
                let xml = match stored {
                    StoredValue::Blank => CellXml::Blank,
                    StoredValue::Number(n) => CellXml::Number(n),
                    StoredValue::Shared(text) => {
                        CellXml::SharedString(shared.ordinal_of(&text).unwrap_or_default())
                    }
                };
                cells.push((cell, xml));
            }
            out.push(WorksheetRow { index, cells });
        }

        Ok((Worksheet { rows: out }, shared))
    }

    /// The `ref` of the `<dimension>` element: the smallest range covering every written cell.
    pub fn dimension(&self) -> String {
        let last_row = self
            .rows
            .iter()
            .filter(|row| !row.cells.is_empty())
            .map(|row| row.index)
            .max();
        let last_col = self
            .rows
            .iter()
            .filter_map(|row| row.cells.last().map(|(cell, _)| cell.col))
            .max();
        match (last_row, last_col) {
            (Some(row), Some(col)) if (row, col) != (1, 1) => {
                let end = CellRef { row, col };
                format!("A1:{end}")
            }
            _ => "A1".to_string(),
        }
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(XML_DECLARATION);
        xml.push_str(&format!(
            r#"<worksheet xmlns="{SPREADSHEETML_NS}" xmlns:r="{OFFICE_REL_NS}">"#
        ));
        xml.push_str(&format!(r#"<dimension ref="{}"/>"#, self.dimension()));
        xml.push_str("<sheetData>");
        for row in &self.rows {
            if row.cells.is_empty() {
                xml.push_str(&format!(r#"<row r="{}"/>"#, row.index));
                continue;
            }
            xml.push_str(&format!(r#"<row r="{}">"#, row.index));
            for (cell, value) in &row.cells {
                push_cell_xml(&mut xml, *cell, value);
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData>");
        xml.push_str("</worksheet>");
        xml
    }
}

fn column_number(idx: usize) -> Result<u32, CellRefError> {
    u32::try_from(idx + 1).map_err(|_| CellRefError::ColumnOutOfRange(u32::MAX))
}

fn push_cell_xml(xml: &mut String, cell: CellRef, value: &CellXml) {
    match value {
        CellXml::Blank => xml.push_str(&format!(r#"<c r="{cell}"/>"#)),
        CellXml::InlineString(text) => {
            let space = if needs_space_preserve(text) {
                r#" xml:space="preserve""#
            } else {
                ""
            };
            xml.push_str(&format!(
                r#"<c r="{cell}" t="inlineStr"><is><t{space}>{}</t></is></c>"#,
                escape_xml(text)
            ));
        }
        CellXml::SharedString(ordinal) => {
            xml.push_str(&format!(r#"<c r="{cell}" t="s"><v>{ordinal}</v></c>"#));
        }
        CellXml::Number(n) => xml.push_str(&format!(r#"<c r="{cell}"><v>{n}</v></c>"#)),
    }
}
