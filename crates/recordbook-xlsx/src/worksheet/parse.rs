use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::cell_ref::CellRef;
use crate::shared_strings::parse::{read_string_item, read_text};
use crate::shared_strings::{SharedStrings, SharedStringsError};

#[derive(Debug, Error)]
pub enum WorksheetError {
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("cell text: {0}")]
    Text(#[from] SharedStringsError),
}

/// Attributes and content of the `<c>` element being parsed.
#[derive(Debug, Default)]
struct PendingCell {
    /// 1-based column, `None` when the `r` attribute is absent.
    col: Option<u32>,
    /// The `r` attribute was present but could not be decoded.
    bad_ref: bool,
    t: Option<String>,
    value: Option<String>,
    inline: Option<String>,
}

impl PendingCell {
    fn from_start(e: &BytesStart<'_>) -> Result<Self, WorksheetError> {
        let mut cell = PendingCell::default();
        for attr in e.attributes().with_checks(false) {
            let attr = attr.map_err(quick_xml::Error::from)?;
            match attr.key.local_name().as_ref() {
                b"r" => {
                    let a1 = attr.unescape_value()?;
                    match CellRef::from_a1(&a1) {
                        Ok(cell_ref) => cell.col = Some(cell_ref.col),
                        Err(err) => {
                            log::debug!("unparseable cell reference {a1:?}: {err}");
                            cell.bad_ref = true;
                        }
                    }
                }
                b"t" => cell.t = Some(attr.unescape_value()?.into_owned()),
                _ => {}
            }
        }
        Ok(cell)
    }

    fn resolve(self, shared: &SharedStrings) -> (Option<u32>, String) {
        if self.bad_ref {
            return (None, String::new());
        }
        let raw = self.value.unwrap_or_default();
        let text = match self.t.as_deref() {
            Some("s") => match raw.trim().parse::<u32>().ok().and_then(|i| shared.lookup(i)) {
                Some(text) => text.to_string(),
                None => {
                    log::debug!("unresolvable shared string reference {raw:?}");
                    String::new()
                }
            },
            Some("inlineStr") => self.inline.unwrap_or(raw),
            Some("b") => match raw.trim() {
                "1" => "TRUE".to_string(),
                "0" => "FALSE".to_string(),
                _ => raw,
            },
            _ => raw,
        };
        (self.col, text)
    }
}

/// Parse the rows of a worksheet part in document order.
///
/// Each cell resolves to its display text: shared-string references go through `shared`, inline
/// strings use their `<is>` text, everything else returns the literal `<v>` text. Cells are
/// positioned by the column of their `r` reference, so columns skipped by the producer read back
/// as empty strings; rows are never padded to a common width.
pub fn parse_worksheet_rows(
    xml: &str,
    shared: &SharedStrings,
) -> Result<Vec<Vec<String>>, WorksheetError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut in_sheet_data = false;
    let mut current_row: Option<Vec<String>> = None;
    let mut current_cell: Option<PendingCell> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => in_sheet_data = true,
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => in_sheet_data = false,

            Event::Start(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                current_row = Some(Vec::new());
            }
            Event::Empty(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                rows.push(Vec::new());
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                if let Some(row) = current_row.take() {
                    rows.push(row);
                }
            }

            Event::Start(e) if current_row.is_some() && e.local_name().as_ref() == b"c" => {
                current_cell = Some(PendingCell::from_start(&e)?);
            }
            Event::Empty(e) if current_row.is_some() && e.local_name().as_ref() == b"c" => {
                let cell = PendingCell::from_start(&e)?;
                if let Some(row) = current_row.as_mut() {
                    place(row, cell.resolve(shared));
                }
            }
            Event::End(e) if current_row.is_some() && e.local_name().as_ref() == b"c" => {
                if let (Some(cell), Some(row)) = (current_cell.take(), current_row.as_mut()) {
                    place(row, cell.resolve(shared));
                }
            }

            Event::Start(e) if current_cell.is_some() && e.local_name().as_ref() == b"v" => {
                let text = read_text(&mut reader, e.name().as_ref())?;
                if let Some(cell) = current_cell.as_mut() {
                    cell.value = Some(text);
                }
            }
            Event::Start(e) if current_cell.is_some() && e.local_name().as_ref() == b"is" => {
                let text = read_string_item(&mut reader, b"is")?;
                if let Some(cell) = current_cell.as_mut() {
                    cell.inline = Some(text);
                }
            }
            Event::Start(e) if current_cell.is_some() => {
                // Formulas (`<f>`) and extension payloads carry nothing the record table needs.
                reader.read_to_end_into(e.name(), &mut Vec::new())?;
            }

            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

/// Put a resolved cell at its column, filling skipped columns with empty strings.
fn place(row: &mut Vec<String>, (col, text): (Option<u32>, String)) {
    let idx = match col {
        Some(col) => col as usize - 1,
        None => row.len(),
    };
    if idx < row.len() {
        row[idx] = text;
        return;
    }
    row.resize(idx, String::new());
    row.push(text);
}
