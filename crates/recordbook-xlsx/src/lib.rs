//! Minimal XLSX support for flat record tables.
//!
//! A record table is one header row plus data rows of scalar values. [`write`] stores a table as a
//! single-sheet SpreadsheetML package (`xl/worksheets/sheet1.xml` plus a shared strings part and
//! the manifest parts a spreadsheet application needs to open it); [`read`] loads the first
//! worksheet of any such package back as strings.
//!
//! Writes never leave a half-written target behind: the archive is assembled next to the target
//! and renamed over it only once complete, and a pre-existing target is first copied to a
//! timestamped backup (see [`recordbook_fs::backup_path`]).
//!
//! ```no_run
//! use recordbook_xlsx::{read, write, CellValue};
//!
//! let headers = ["name", "amount"];
//! let rows = vec![
//!     vec![CellValue::from("Somchai"), CellValue::from(30000)],
//!     vec![CellValue::from("Somying"), CellValue::from("35000.50")],
//! ];
//! let written = write("records.xlsx", &headers, &rows)?;
//! assert_eq!(written, 2);
//!
//! let table = read("records.xlsx")?;
//! assert_eq!(table.headers, ["name", "amount"]);
//! assert_eq!(table.rows[1], ["Somying", "35000.5"]);
//! # Ok::<(), recordbook_xlsx::XlsxError>(())
//! ```

pub mod cell_ref;
mod error;
mod options;
pub mod package;
pub mod path;
mod reader;
pub mod shared_strings;
mod value;
pub mod worksheet;
mod writer;
mod xml;
mod zip_util;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use cell_ref::{CellRef, CellRefError};
pub use error::{OpenFailure, WriteFailure, WriteStep, XlsxError};
pub use options::{ReadOptions, WriteOptions};
pub use shared_strings::{SharedStringTable, SharedStrings};
pub use value::{canonical_number, normalize_text, CellValue, ValueMode};
pub use worksheet::Worksheet;

/// A table as read back from a package: every cell is its display text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    /// Split worksheet rows into the header row and data rows.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut rows = rows.into_iter();
        let headers = rows.next().unwrap_or_default();
        Self {
            headers,
            rows: rows.collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

/// Write `headers` and `rows` to `target` with [`WriteOptions::default`].
///
/// Returns the number of data rows written.
pub fn write<S: AsRef<str>>(
    target: impl AsRef<Path>,
    headers: &[S],
    rows: &[Vec<CellValue>],
) -> Result<usize, XlsxError> {
    write_with_options(target, headers, rows, &WriteOptions::default())
}

/// Write `headers` and `rows` to `target`.
///
/// If `target` exists it is copied to a timestamped backup first (unless
/// [`WriteOptions::backup`] is off), and it is only replaced once the new archive has been fully
/// assembled. On failure `target` is unchanged and the error names the [`WriteStep`] that failed.
pub fn write_with_options<S: AsRef<str>>(
    target: impl AsRef<Path>,
    headers: &[S],
    rows: &[Vec<CellValue>],
    options: &WriteOptions,
) -> Result<usize, XlsxError> {
    let target = target.as_ref();
    let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
    let parts = writer::build_parts(&headers, rows, options)?;
    writer::write_package(target, &parts, rows.len(), options)
}

/// Read the first worksheet of the package at `source` with [`ReadOptions::default`].
pub fn read(source: impl AsRef<Path>) -> Result<RecordTable, XlsxError> {
    read_with_options(source, &ReadOptions::default())
}

/// Read the first worksheet of the package at `source`.
///
/// The first row becomes [`RecordTable::headers`]; later rows are returned in document order
/// without padding. Without a shared strings part, shared-string cells read as empty text; a
/// package without its worksheet part fails with [`XlsxError::MissingPart`].
pub fn read_with_options(
    source: impl AsRef<Path>,
    options: &ReadOptions,
) -> Result<RecordTable, XlsxError> {
    reader::read_package(source.as_ref(), options)
}
