use std::io::{Read, Seek};

use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::OpenFailure;

/// Default maximum uncompressed size of any single part inflated into memory (256 MiB).
pub(crate) const DEFAULT_MAX_ZIP_PART_BYTES: u64 = 256 * 1024 * 1024;

/// Canonical form of an entry name for tolerant matching: leading separators dropped,
/// percent-escapes decoded, backslashes turned into `/`, ASCII lowercased.
fn canonical_part_name(name: &str) -> Vec<u8> {
    fn hex_val(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let mut b = bytes[i];
        i += 1;
        if b == b'%' {
            if let (Some(hi), Some(lo)) = (
                bytes.get(i).copied().and_then(hex_val),
                bytes.get(i + 1).copied().and_then(hex_val),
            ) {
                b = (hi << 4) | lo;
                i += 2;
            }
        }
        let b = if b == b'\\' { b'/' } else { b.to_ascii_lowercase() };
        if out.is_empty() && b == b'/' {
            continue;
        }
        out.push(b);
    }
    out
}

pub(crate) fn zip_part_names_equivalent(a: &str, b: &str) -> bool {
    canonical_part_name(a) == canonical_part_name(b)
}

/// Open the entry named `name`, preferring an exact match over a tolerant one.
///
/// Third-party producers sometimes write entries with a leading `/`, backslash separators,
/// different ASCII case or percent-escapes.
pub(crate) fn open_zip_part<'a, R: Read + Seek>(
    archive: &'a mut ZipArchive<R>,
    name: &str,
) -> Result<ZipFile<'a, R>, ZipError> {
    let mut fallback = None;
    let mut exact = None;
    for (idx, entry) in archive.file_names().enumerate() {
        if entry == name {
            exact = Some(idx);
            break;
        }
        if fallback.is_none() && zip_part_names_equivalent(entry, name) {
            fallback = Some(idx);
        }
    }
    match exact.or(fallback) {
        Some(idx) => archive.by_index(idx),
        None => Err(ZipError::FileNotFound),
    }
}

/// Inflate `file` into memory, refusing parts larger than `max_bytes`.
///
/// The declared size is checked first, then the read itself is capped at `max_bytes + 1` so a
/// forged size field cannot get past the limit.
pub(crate) fn read_zip_file_bytes_with_limit<R: Read>(
    file: &mut ZipFile<'_, R>,
    part: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, OpenFailure> {
    let declared = file.size();
    if declared > max_bytes {
        return Err(OpenFailure::PartTooLarge {
            part: part.to_string(),
            size: declared,
            max: max_bytes,
        });
    }

    let mut buf = Vec::new();
    file.take(max_bytes.saturating_add(1)).read_to_end(&mut buf)?;
    let observed = buf.len() as u64;
    if observed > max_bytes {
        return Err(OpenFailure::PartTooLarge {
            part: part.to_string(),
            size: observed,
            max: max_bytes,
        });
    }
    Ok(buf)
}

/// Read a part by name, returning `Ok(None)` when the archive has no such entry.
pub(crate) fn read_zip_part_optional_with_limit<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    max_part_bytes: u64,
) -> Result<Option<Vec<u8>>, OpenFailure> {
    match open_zip_part(archive, name) {
        Ok(mut file) => {
            if file.is_dir() {
                return Ok(None);
            }
            read_zip_file_bytes_with_limit(&mut file, name, max_part_bytes).map(Some)
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
