use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{OpenFailure, XlsxError};
use crate::options::ReadOptions;
use crate::package::relationships::{
    REL_TYPE_OFFICE_DOCUMENT, REL_TYPE_SHARED_STRINGS, REL_TYPE_WORKSHEET,
};
use crate::package::{
    ContentTypes, PartKind, Relationships, WorkbookPart, CONTENT_TYPES_PART, ROOT_RELS_PART,
    SHARED_STRINGS_PART, WORKBOOK_PART, WORKSHEET_PART,
};
use crate::path::{rels_for_part, resolve_target};
use crate::shared_strings::{parse_shared_strings_xml, SharedStrings};
use crate::worksheet::parse_worksheet_rows;
use crate::zip_util::read_zip_part_optional_with_limit;
use crate::RecordTable;

/// Archive locations of the parts a read needs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PartLocations {
    worksheet: String,
    shared_strings: String,
}

pub(crate) fn read_package(path: &Path, options: &ReadOptions) -> Result<RecordTable, XlsxError> {
    let file = File::open(path).map_err(|err| XlsxError::open(path, err))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|err| XlsxError::open(path, err))?;
    read_archive(&mut archive, options).map_err(|err| match err {
        ReadError::Open(source) => XlsxError::open(path, source),
        ReadError::Missing(part) => XlsxError::MissingPart(part),
    })
}

#[derive(Debug)]
enum ReadError {
    Open(OpenFailure),
    Missing(String),
}

impl From<OpenFailure> for ReadError {
    fn from(err: OpenFailure) -> Self {
        ReadError::Open(err)
    }
}

fn read_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    options: &ReadOptions,
) -> Result<RecordTable, ReadError> {
    let max = options.max_part_bytes;
    let locations = locate_parts(archive, max)?;
    log::debug!(
        "worksheet at {}, shared strings at {}",
        locations.worksheet,
        locations.shared_strings
    );
    let expected = PartKind::Worksheet.content_type();
    match declared_content_type(archive, &locations.worksheet, max)? {
        Some(declared) if Some(declared.as_str()) != expected => log::warn!(
            "{} is registered as {declared}; reading it as a worksheet anyway",
            locations.worksheet
        ),
        _ => {}
    }

    let shared = match read_zip_part_optional_with_limit(archive, &locations.shared_strings, max)? {
        Some(bytes) => {
            let xml = utf8(&bytes, &locations.shared_strings)?;
            parse_shared_strings_xml(xml).map_err(|source| OpenFailure::SharedStrings {
                part: locations.shared_strings.clone(),
                source,
            })?
        }
        None => {
            log::debug!("no shared strings part; using an empty table");
            SharedStrings::default()
        }
    };

    let Some(bytes) = read_zip_part_optional_with_limit(archive, &locations.worksheet, max)? else {
        return Err(ReadError::Missing(locations.worksheet));
    };
    let xml = utf8(&bytes, &locations.worksheet)?;
    let rows = parse_worksheet_rows(xml, &shared).map_err(|source| OpenFailure::Worksheet {
        part: locations.worksheet.clone(),
        source,
    })?;

    Ok(RecordTable::from_rows(rows))
}

/// Follow `_rels/.rels` -> workbook -> first sheet -> workbook rels to the worksheet and shared
/// strings parts. Every hop that is absent falls back to the conventional part name.
fn locate_parts<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    max: u64,
) -> Result<PartLocations, OpenFailure> {
    let workbook = match read_zip_part_optional_with_limit(archive, ROOT_RELS_PART, max)? {
        Some(bytes) => Relationships::parse(&bytes, ROOT_RELS_PART)?
            .by_type(REL_TYPE_OFFICE_DOCUMENT)
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| WORKBOOK_PART.to_string()),
        None => WORKBOOK_PART.to_string(),
    };

    let sheet_rel_id = match read_zip_part_optional_with_limit(archive, &workbook, max)? {
        Some(bytes) => WorkbookPart::parse(&bytes, &workbook)?
            .first_sheet()
            .map(|sheet| sheet.rel_id.clone()),
        None => None,
    };

    let rels_name = rels_for_part(&workbook);
    let workbook_rels = match read_zip_part_optional_with_limit(archive, &rels_name, max)? {
        Some(bytes) => Relationships::parse(&bytes, &rels_name)?,
        None => Relationships::default(),
    };

    let worksheet = sheet_rel_id
        .as_deref()
        .and_then(|id| workbook_rels.by_id(id))
        .or_else(|| workbook_rels.by_type(REL_TYPE_WORKSHEET))
        .map(|rel| resolve_target(&workbook, &rel.target))
        .unwrap_or_else(|| WORKSHEET_PART.to_string());
    let shared_strings = workbook_rels
        .by_type(REL_TYPE_SHARED_STRINGS)
        .map(|rel| resolve_target(&workbook, &rel.target))
        .unwrap_or_else(|| SHARED_STRINGS_PART.to_string());

    Ok(PartLocations {
        worksheet,
        shared_strings,
    })
}

/// The content type `[Content_Types].xml` assigns to `part`, if the registry exists and parses.
fn declared_content_type<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    max: u64,
) -> Result<Option<String>, OpenFailure> {
    let Some(bytes) = read_zip_part_optional_with_limit(archive, CONTENT_TYPES_PART, max)? else {
        return Ok(None);
    };
    match ContentTypes::parse(&bytes, CONTENT_TYPES_PART) {
        Ok(types) => Ok(types.content_type_of(part).map(str::to_string)),
        Err(err) => {
            log::warn!("ignoring unreadable content types: {err}");
            Ok(None)
        }
    }
}

fn utf8<'a>(bytes: &'a [u8], part: &str) -> Result<&'a str, OpenFailure> {
    let xml = std::str::from_utf8(bytes).map_err(|source| OpenFailure::NonUtf8 {
        part: part.to_string(),
        source,
    })?;
    Ok(xml.strip_prefix('\u{feff}').unwrap_or(xml))
}
