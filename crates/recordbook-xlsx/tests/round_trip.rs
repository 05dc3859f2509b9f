use std::fs;
use std::io::Read;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use recordbook_xlsx::{
    normalize_text, read, write, write_with_options, CellValue, ValueMode, WriteOptions,
};
use zip::ZipArchive;

fn text_rows(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
    rows.iter()
        .map(|row| row.iter().map(|v| CellValue::from(*v)).collect())
        .collect()
}

fn zip_part(path: &std::path::Path, name: &str) -> String {
    let mut archive = ZipArchive::new(fs::File::open(path).expect("open xlsx")).expect("zip");
    let mut out = String::new();
    archive
        .by_name(name)
        .unwrap_or_else(|e| panic!("missing {name}: {e}"))
        .read_to_string(&mut out)
        .expect("read part");
    out
}

#[test]
fn two_row_table_round_trips_with_two_shared_strings() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("records.xlsx");

    let headers = ["name", "amount"];
    let rows = text_rows(&[&["Somchai", "30000"], &["Somying", "35000.5"]]);
    let written = write(&path, &headers, &rows).expect("write");
    assert_eq!(written, 2);

    let mut archive =
        ZipArchive::new(fs::File::open(&path).expect("open xlsx")).expect("valid zip");
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    assert_eq!(
        names,
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/app.xml",
            "docProps/core.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/sharedStrings.xml",
            "xl/workbook.xml",
            "xl/worksheets/sheet1.xml",
        ]
    );
    let entry = archive.by_name("xl/worksheets/sheet1.xml").expect("worksheet");
    assert_eq!(entry.compression(), zip::CompressionMethod::Deflated);
    drop(entry);

    let sst = zip_part(&path, "xl/sharedStrings.xml");
    assert!(sst.contains(r#"count="2" uniqueCount="2""#), "{sst}");

    let workbook = zip_part(&path, "xl/workbook.xml");
    assert!(workbook.contains(r#"<sheet name="Sheet1" sheetId="1" r:id="rId1"/>"#));

    let table = read(&path).expect("read");
    assert_eq!(table.headers, vec!["name", "amount"]);
    assert_eq!(
        table.rows,
        vec![vec!["Somchai", "30000"], vec!["Somying", "35000.5"]]
    );
}

#[test]
fn numbers_read_back_in_canonical_form() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("numbers.xlsx");

    let rows = text_rows(&[&["7", "7.0", "35000.50", " 12 ", "1e3", "-0", "00123"]]);
    let mut rows = rows;
    rows.push(vec![
        CellValue::from(42),
        CellValue::from(2.5),
        CellValue::from(f64::NAN),
        CellValue::Empty,
        CellValue::from(None::<i64>),
        CellValue::from(-3i64),
        CellValue::from("x"),
    ]);
    write(&path, &["a", "b", "c", "d", "e", "f", "g"], &rows).expect("write");

    let table = read(&path).expect("read");
    assert_eq!(
        table.rows,
        vec![
            vec!["7", "7", "35000.5", "12", "1000", "0", "123"],
            vec!["42", "2.5", "NaN", "", "", "-3", "x"],
        ]
    );
}

#[test]
fn forced_string_columns_keep_their_text() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("accounts.xlsx");

    let rows = text_rows(&[&["00123", "0100"]]);
    let options = WriteOptions::default().force_string("account_no");
    write_with_options(&path, &["account_no", "balance"], &rows, &options).expect("write");
    assert_eq!(read(&path).expect("read").rows, vec![vec!["00123", "100"]]);

    let options = WriteOptions::default().with_default_mode(ValueMode::ForceString);
    write_with_options(&path, &["account_no", "balance"], &rows, &options).expect("write");
    assert_eq!(read(&path).expect("read").rows, vec![vec!["00123", "0100"]]);
}

#[test]
fn empty_and_header_only_tables() {
    let dir = tempfile::tempdir().expect("temp dir");

    let path = dir.path().join("headers.xlsx");
    let written = write(&path, &["name", "amount"], &[]).expect("write");
    assert_eq!(written, 0);
    let table = read(&path).expect("read");
    assert_eq!(table.headers, vec!["name", "amount"]);
    assert!(table.rows.is_empty());

    let path = dir.path().join("empty.xlsx");
    write(&path, &[] as &[&str], &[]).expect("write");
    let table = read(&path).expect("read");
    assert!(table.is_empty(), "{table:?}");
    let sst = zip_part(&path, "xl/sharedStrings.xml");
    assert!(sst.contains(r#"count="0" uniqueCount="0""#), "{sst}");
}

#[test]
fn repeated_values_share_one_entry() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("dupes.xlsx");

    let rows = text_rows(&[&["a", "b"], &["b", "a"], &["a", "a"]]);
    write(&path, &["x", "y"], &rows).expect("write");

    let sst = zip_part(&path, "xl/sharedStrings.xml");
    assert!(sst.contains(r#"count="2" uniqueCount="2""#), "{sst}");
    assert_eq!(
        read(&path).expect("read").rows,
        vec![vec!["a", "b"], vec!["b", "a"], vec!["a", "a"]]
    );
}

#[test]
fn fixed_timestamp_makes_output_reproducible() {
    let dir = tempfile::tempdir().expect("temp dir");
    let a = dir.path().join("a.xlsx");
    let b = dir.path().join("b.xlsx");

    let rows = text_rows(&[&["Somying", "35000.5"], &["Somchai", "30000"]]);
    let options = WriteOptions::default()
        .with_timestamp(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
        .with_backup(false);
    write_with_options(&a, &["name", "amount"], &rows, &options).expect("write a");
    write_with_options(&b, &["name", "amount"], &rows, &options).expect("write b");

    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    assert!(zip_part(&a, "docProps/core.xml").contains("2024-06-01T12:00:00Z"));
}

#[test]
fn uncompressed_archives_are_readable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("stored.xlsx");

    let options = WriteOptions::default().with_compression(false);
    write_with_options(&path, &["k"], &text_rows(&[&["v"]]), &options).expect("write");

    let mut archive = ZipArchive::new(fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(
        archive.by_name("xl/worksheets/sheet1.xml").unwrap().compression(),
        zip::CompressionMethod::Stored
    );
    assert_eq!(read(&path).expect("read").rows, vec![vec!["v"]]);
}

#[test]
fn markup_and_whitespace_survive() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("markup.xlsx");

    let rows = text_rows(&[&["a & b", "<tag attr=\"x\">", "it's"]]);
    write(&path, &[" padded ", "h2", "h3"], &rows).expect("write");

    let table = read(&path).expect("read");
    assert_eq!(table.headers, vec![" padded ", "h2", "h3"]);
    assert_eq!(table.rows, vec![vec!["a & b", "<tag attr=\"x\">", "it's"]]);
}

#[test]
fn characters_xml_cannot_carry_do_not_split_shared_strings() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("controls.xlsx");

    let rows = text_rows(&[&["a"], &["a\u{1}"], &["\u{1}"], &["x\u{FFFE}y\u{FFFF}"]]);
    write(&path, &["v"], &rows).expect("write");

    let sst = zip_part(&path, "xl/sharedStrings.xml");
    assert!(sst.contains(r#"count="2" uniqueCount="2""#), "{sst}");
    assert!(sst.contains("<si><t>a</t></si><si><t>xy</t></si>"), "{sst}");
    roxmltree::Document::parse(&sst).expect("sharedStrings.xml is well-formed");
    roxmltree::Document::parse(&zip_part(&path, "xl/worksheets/sheet1.xml"))
        .expect("sheet1.xml is well-formed");

    let table = read(&path).expect("read");
    assert_eq!(
        table.rows,
        vec![vec!["a"], vec!["a"], vec![""], vec!["xy"]]
    );
}

#[test]
fn carriage_returns_survive_conforming_parsers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("crlf.xlsx");

    let rows = text_rows(&[&["l1\r\nl2"]]);
    write(&path, &["h\r\n"], &rows).expect("write");

    let sst = zip_part(&path, "xl/sharedStrings.xml");
    let doc = roxmltree::Document::parse(&sst).expect("parse sharedStrings.xml");
    let text = doc
        .descendants()
        .find(|n| n.has_tag_name("t"))
        .and_then(|n| n.text())
        .expect("one <t>");
    assert_eq!(text, "l1\r\nl2");

    let table = read(&path).expect("read");
    assert_eq!(table.headers, vec!["h\r\n"]);
    assert_eq!(table.rows, vec![vec!["l1\r\nl2"]]);
}

/// Cell text that exercises numeric inference: integers, decimals, leading zeros, exponent forms,
/// words and blanks.
fn inferred_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        "-?[0-9]{1,7}",
        "-?[0-9]{1,4}\\.[0-9]{1,4}",
        "0{1,3}[1-9][0-9]{0,3}",
        "[1-9]\\.[0-9]{1,3}[eE]-?[0-9]{1,2}",
        " ?[a-zA-Z][a-zA-Z0-9 ]{0,8}",
        "[0-9]{1,3}-[0-9]{1,3}",
        " {0,2}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn inferred_tables_round_trip_after_normalization(
        headers in prop::collection::vec("[a-z]{1,6}", 1..4),
        rows in prop::collection::vec(prop::collection::vec(inferred_cell(), 0..5), 0..6),
    ) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("inferred.xlsx");

        let values: Vec<Vec<CellValue>> = rows
            .iter()
            .map(|row| row.iter().map(CellValue::from).collect())
            .collect();
        let options = WriteOptions::default().with_backup(false);
        let written = write_with_options(&path, &headers, &values, &options).expect("write");
        prop_assert_eq!(written, rows.len());

        let table = read(&path).expect("read");
        let expected: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|v| normalize_text(v)).collect())
            .collect();
        prop_assert_eq!(table.headers, headers);
        prop_assert_eq!(table.rows, expected);
    }

    #[test]
    fn forced_string_tables_round_trip(
        headers in prop::collection::vec("[a-zA-Z0-9 _]{0,8}", 0..5),
        rows in prop::collection::vec(
            prop::collection::vec("[ a-zA-Z0-9.&<>'\"-]{0,10}", 0..5),
            0..6,
        ),
    ) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("prop.xlsx");

        let values: Vec<Vec<CellValue>> = rows
            .iter()
            .map(|row| row.iter().map(CellValue::from).collect())
            .collect();
        let options = WriteOptions::default()
            .with_default_mode(ValueMode::ForceString)
            .with_backup(false);
        let written = write_with_options(&path, &headers, &values, &options).expect("write");
        prop_assert_eq!(written, rows.len());

        let table = read(&path).expect("read");
        let expected: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|v| v.trim().to_string()).collect())
            .collect();
        prop_assert_eq!(table.headers, headers);
        prop_assert_eq!(table.rows, expected);
    }
}
