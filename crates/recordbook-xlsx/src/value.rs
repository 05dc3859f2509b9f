//! Cell values accepted by the writer and the numeric-inference rule that decides how each one is
//! stored.

use serde::{Deserialize, Serialize};

use crate::xml::xml_legal_text;

/// Largest magnitude at which every integer is exactly representable as `f64` (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// One cell of a record row as supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&String> for CellValue {
    fn from(value: &String) -> Self {
        CellValue::Text(value.clone())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value.into())
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Integer(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Decimal(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// How text cells in a column are stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    /// Text that parses as a finite decimal number is stored as a bare number.
    ///
    /// This drops leading zeros (`"00123"` reads back as `"123"`).
    #[default]
    InferNumeric,
    /// Text is always stored as a string, exactly as trimmed.
    ForceString,
}

/// The on-disk form chosen for one cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StoredValue {
    Blank,
    /// Canonical decimal text of a numeric literal.
    Number(String),
    /// A shared-string value.
    Shared(String),
}

impl CellValue {
    pub(crate) fn classify(&self, mode: ValueMode) -> StoredValue {
        match self {
            CellValue::Empty => StoredValue::Blank,
            CellValue::Integer(n) => StoredValue::Number(n.to_string()),
            CellValue::Decimal(n) => match canonical_number(*n) {
                Some(text) => StoredValue::Number(text),
                None => StoredValue::Shared(n.to_string()),
            },
            CellValue::Text(text) => classify_text(text, mode),
        }
    }
}

/// Characters XML cannot carry are removed before trimming, so the value registered in the string
/// table is exactly the value a reader gets back.
fn classify_text(text: &str, mode: ValueMode) -> StoredValue {
    let legal = xml_legal_text(text);
    let trimmed = legal.trim();
    if trimmed.is_empty() {
        return StoredValue::Blank;
    }
    if mode == ValueMode::InferNumeric {
        if let Some(number) = parse_decimal(trimmed).and_then(canonical_number) {
            return StoredValue::Number(number);
        }
    }
    StoredValue::Shared(trimmed.to_string())
}

fn parse_decimal(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Canonical decimal text for a finite number.
///
/// Integral values below 2^53 in magnitude print without a fractional part (`7.0` -> `7`, `-0` ->
/// `0`); everything else prints as the shortest decimal that round-trips, never in exponent form.
pub fn canonical_number(n: f64) -> Option<String> {
    if !n.is_finite() {
        return None;
    }
    if n == 0.0 {
        return Some("0".to_string());
    }
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        return Some((n as i64).to_string());
    }
    Some(n.to_string())
}

/// Canonical form of `text` as the writer would store it under [`ValueMode::InferNumeric`].
///
/// This is what [`crate::read`] returns for a cell written from `text`.
pub fn normalize_text(text: &str) -> String {
    match classify_text(text, ValueMode::InferNumeric) {
        StoredValue::Blank => String::new(),
        StoredValue::Number(n) | StoredValue::Shared(n) => n,
    }
}
