//! A1-style cell reference codec.
//!
//! Rows and columns are **1-based** here, matching the on-disk notation:
//! - `row = 1` is the header row
//! - `col = 1` is column `A`
//!
//! Column letters use bijective base-26 numbering (`A..Z`, `AA..AZ`, ..., `XFD`), so encoding stays
//! correct past column 26.

use core::fmt;

/// Largest column index a worksheet can address (`XFD`).
pub const MAX_COLS: u32 = 16_384;
/// Largest row index a worksheet can address.
pub const MAX_ROWS: u32 = 1_048_576;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellRefError {
    /// Row index below 1 or beyond [`MAX_ROWS`].
    RowOutOfRange(u32),
    /// Column index below 1 or beyond [`MAX_COLS`].
    ColumnOutOfRange(u32),
    Empty,
    MissingColumn,
    MissingRow,
    InvalidColumn,
    InvalidRow,
    TrailingCharacters,
}

impl fmt::Display for CellRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRefError::RowOutOfRange(row) => write!(f, "row {row} is out of range (1..={MAX_ROWS})"),
            CellRefError::ColumnOutOfRange(col) => {
                write!(f, "column {col} is out of range (1..={MAX_COLS})")
            }
            CellRefError::Empty => f.write_str("empty cell reference"),
            CellRefError::MissingColumn => f.write_str("missing column letters"),
            CellRefError::MissingRow => f.write_str("missing row number"),
            CellRefError::InvalidColumn => f.write_str("invalid column letters"),
            CellRefError::InvalidRow => f.write_str("invalid row number"),
            CellRefError::TrailingCharacters => f.write_str("unexpected trailing characters"),
        }
    }
}

impl std::error::Error for CellRefError {}

/// A single cell position, 1-based in both dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    /// Construct a reference, validating that both coordinates are addressable.
    pub fn new(row: u32, col: u32) -> Result<Self, CellRefError> {
        if col < 1 || col > MAX_COLS {
            return Err(CellRefError::ColumnOutOfRange(col));
        }
        if row < 1 || row > MAX_ROWS {
            return Err(CellRefError::RowOutOfRange(row));
        }
        Ok(Self { row, col })
    }

    /// Convert to A1 notation (e.g. `A1`, `BC32`).
    pub fn to_a1(self) -> String {
        let mut out = col_to_name(self.col);
        out.push_str(&self.row.to_string());
        out
    }

    /// Parse an A1-style reference (e.g. `A1`, `$B$2`, `bc32`).
    pub fn from_a1(a1: &str) -> Result<Self, CellRefError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(CellRefError::Empty);
        }

        // Accept optional `$` markers.
        let bytes = s.as_bytes();
        let mut idx = 0usize;
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let col_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_alphabetic() {
            idx += 1;
        }
        if idx == col_start {
            return Err(CellRefError::MissingColumn);
        }
        let col_str = &s[col_start..idx];

        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let row_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx == row_start {
            return Err(CellRefError::MissingRow);
        }
        if idx != bytes.len() {
            return Err(CellRefError::TrailingCharacters);
        }

        let col = name_to_col(col_str)?;
        let row: u32 = s[row_start..idx]
            .parse()
            .map_err(|_| CellRefError::InvalidRow)?;
        if row == 0 || row > MAX_ROWS {
            return Err(CellRefError::InvalidRow);
        }

        Ok(Self { row, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Encode a 1-based `(row, col)` pair as an A1 address.
///
/// Fails instead of truncating when either coordinate is not addressable.
pub fn encode(row: u32, col: u32) -> Result<String, CellRefError> {
    CellRef::new(row, col).map(CellRef::to_a1)
}

/// Decode an A1 address into a 1-based `(row, col)` pair. Exact inverse of [`encode`].
pub fn decode(address: &str) -> Result<(u32, u32), CellRefError> {
    let cell = CellRef::from_a1(address)?;
    Ok((cell.row, cell.col))
}

/// Column letters for a 1-based column index. `col` must be at least 1.
pub(crate) fn col_to_name(col: u32) -> String {
    let mut n = col;
    let mut out = Vec::<u8>::with_capacity(3);
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

fn name_to_col(s: &str) -> Result<u32, CellRefError> {
    let mut col: u32 = 0;
    for b in s.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(CellRefError::InvalidColumn);
        }
        let v = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(v))
            .filter(|c| *c <= MAX_COLS)
            .ok_or(CellRefError::InvalidColumn)?;
    }
    Ok(col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_single_and_multi_letter_columns() {
        assert_eq!(encode(1, 1).unwrap(), "A1");
        assert_eq!(encode(7, 2).unwrap(), "B7");
        assert_eq!(encode(1, 26).unwrap(), "Z1");
        assert_eq!(encode(1, 27).unwrap(), "AA1");
        assert_eq!(encode(1, 52).unwrap(), "AZ1");
        assert_eq!(encode(1, 53).unwrap(), "BA1");
        assert_eq!(encode(1, 702).unwrap(), "ZZ1");
        assert_eq!(encode(1, 703).unwrap(), "AAA1");
        assert_eq!(encode(32, 55).unwrap(), "BC32");
        assert_eq!(encode(MAX_ROWS, MAX_COLS).unwrap(), "XFD1048576");
    }

    #[test]
    fn encode_rejects_column_zero() {
        assert_eq!(encode(1, 0), Err(CellRefError::ColumnOutOfRange(0)));
        assert_eq!(encode(0, 1), Err(CellRefError::RowOutOfRange(0)));
        assert_eq!(
            encode(1, MAX_COLS + 1),
            Err(CellRefError::ColumnOutOfRange(MAX_COLS + 1))
        );
        assert_eq!(
            encode(MAX_ROWS + 1, 1),
            Err(CellRefError::RowOutOfRange(MAX_ROWS + 1))
        );
    }

    #[test]
    fn decode_accepts_absolute_markers_and_lowercase() {
        assert_eq!(decode("A1").unwrap(), (1, 1));
        assert_eq!(decode("$B$7").unwrap(), (7, 2));
        assert_eq!(decode("bc32").unwrap(), (32, 55));
        assert_eq!(decode(" AA10 ").unwrap(), (10, 27));
    }

    #[test]
    fn decode_rejects_malformed_addresses() {
        assert_eq!(decode(""), Err(CellRefError::Empty));
        assert_eq!(decode("12"), Err(CellRefError::MissingColumn));
        assert_eq!(decode("AB"), Err(CellRefError::MissingRow));
        assert_eq!(decode("A0"), Err(CellRefError::InvalidRow));
        assert_eq!(decode("A1B"), Err(CellRefError::TrailingCharacters));
        assert_eq!(decode("XFE1"), Err(CellRefError::InvalidColumn));
        assert_eq!(decode("A1048577"), Err(CellRefError::InvalidRow));
        assert_eq!(decode("A99999999999"), Err(CellRefError::InvalidRow));
    }

    proptest! {
        #[test]
        fn codec_is_bijective(row in 1u32..=MAX_ROWS, col in 1u32..=MAX_COLS) {
            let address = encode(row, col).unwrap();
            prop_assert_eq!(decode(&address).unwrap(), (row, col));
        }
    }

    #[test]
    fn codec_is_bijective_for_every_column() {
        for col in 1..=MAX_COLS {
            let address = encode(3, col).unwrap();
            assert_eq!(decode(&address).unwrap(), (3, col), "column {col} via {address}");
        }
    }
}
