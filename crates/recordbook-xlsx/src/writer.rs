//! Package assembly: scratch tree, backup, archive, atomic swap.

use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use recordbook_fs::AtomicWriteError;
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{WriteFailure, WriteStep, XlsxError};
use crate::options::WriteOptions;
use crate::package::{
    ManifestBuilder, Part, PartKind, PartSet, CONTENT_TYPES_PART, SHARED_STRINGS_PART,
    WORKSHEET_PART,
};
use crate::shared_strings::{write_shared_strings_xml, SharedStringTable};
use crate::value::CellValue;
use crate::worksheet::Worksheet;

/// Serialize every part of the package for one table.
///
/// All per-write state (the string table, the part list) lives in this call.
pub(crate) fn build_parts(
    headers: &[String],
    rows: &[Vec<CellValue>],
    options: &WriteOptions,
) -> Result<PartSet, XlsxError> {
    let mut strings = SharedStringTable::new();
    let (worksheet, shared) = Worksheet::build(headers, rows, options, &mut strings)?;
    log::debug!(
        "serialized worksheet {} with {} shared strings",
        worksheet.dimension(),
        shared.len()
    );

    let timestamp = options.timestamp.unwrap_or_else(Utc::now);
    let mut manifest = ManifestBuilder::new(timestamp);
    if let Some(creator) = &options.creator {
        manifest = manifest.with_creator(creator.clone());
    }
    let mut parts = manifest.build();
    parts.push(Part::new(
        SHARED_STRINGS_PART,
        PartKind::SharedStrings,
        write_shared_strings_xml(&shared),
    ));
    parts.push(Part::new(WORKSHEET_PART, PartKind::Worksheet, worksheet.to_xml()));
    Ok(PartSet::new(parts))
}

/// Write `parts` to `target`, replacing it only once the new archive is complete.
///
/// Returns the number of data rows written. On any failure `target` is left exactly as it was
/// and the scratch tree is removed.
pub(crate) fn write_package(
    target: &Path,
    parts: &PartSet,
    data_rows: usize,
    options: &WriteOptions,
) -> Result<usize, XlsxError> {
    let scratch = stage_scratch_tree(parts, options.scratch_root.as_deref())
        .map_err(|err| XlsxError::write(target, WriteStep::Scratch, err))?;
    log::debug!("staged {} parts in {}", parts.len(), scratch.path().display());

    if options.backup {
        let backup = recordbook_fs::backup_existing(target, Local::now().naive_local())
            .map_err(|err| XlsxError::write(target, WriteStep::Backup, err))?;
        if let Some(backup) = backup {
            log::info!("backed up {} to {}", target.display(), backup.display());
        }
    }

    let compression = if options.compress {
        CompressionMethod::Deflated
    } else {
        CompressionMethod::Stored
    };
    recordbook_fs::atomic_write(target, |file| {
        zip_scratch_tree(file, scratch.path(), compression)
    })
    .map_err(|err| match err {
        AtomicWriteError::Io(err) => XlsxError::write(target, WriteStep::Assemble, err),
        AtomicWriteError::Writer(err) => XlsxError::write(target, WriteStep::Assemble, err),
        AtomicWriteError::Replace(err) => XlsxError::write(target, WriteStep::Commit, err),
    })?;

    let scratch_path = scratch.path().to_path_buf();
    if let Err(err) = scratch.close() {
        log::warn!(
            "failed to remove scratch tree {}: {err}",
            scratch_path.display()
        );
    }

    log::info!("wrote {data_rows} rows to {}", target.display());
    Ok(data_rows)
}

/// Materialize every part as a file under a fresh, process-unique directory.
fn stage_scratch_tree(parts: &PartSet, root: Option<&Path>) -> io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("recordbook-xlsx-");
    let scratch = match root {
        Some(root) => {
            fs::create_dir_all(root)?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };

    for part in parts.iter() {
        let path = scratch.path().join(&part.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, part.xml.as_bytes())?;
    }
    Ok(scratch)
}

/// Entry names of the scratch tree in archive order.
fn scratch_entries(root: &Path) -> Result<Vec<(String, PathBuf)>, WriteFailure> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| io::Error::other("scratch entry outside scratch root"))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push((name, entry.into_path()));
    }
    entries.sort_by(|(a, _), (b, _)| {
        (a != CONTENT_TYPES_PART, a.as_str()).cmp(&(b != CONTENT_TYPES_PART, b.as_str()))
    });
    Ok(entries)
}

/// Write the scratch tree rooted at `root` into `out` as a ZIP archive.
pub(crate) fn zip_scratch_tree<W: Write + Seek>(
    out: W,
    root: &Path,
    compression: CompressionMethod,
) -> Result<(), WriteFailure> {
    let options = FileOptions::<()>::default().compression_method(compression);
    let mut zip = ZipWriter::new(out);
    for (name, path) in scratch_entries(root)? {
        zip.start_file(name, options)?;
        let mut file = File::open(&path)?;
        io::copy(&mut file, &mut zip)?;
    }
    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    use chrono::TimeZone;
    use zip::ZipArchive;

    use crate::package::CORE_PROPS_PART;

    fn parts() -> PartSet {
        let headers = vec!["name".to_string(), "amount".to_string()];
        let rows = vec![vec![CellValue::from("Somchai"), CellValue::from("30000")]];
        let options = WriteOptions::default()
            .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        build_parts(&headers, &rows, &options).unwrap()
    }

    #[test]
    fn archive_lists_content_types_first_then_sorted_names() {
        let parts = parts();
        let scratch = stage_scratch_tree(&parts, None).unwrap();
        let mut buf = Cursor::new(Vec::new());
        zip_scratch_tree(&mut buf, scratch.path(), CompressionMethod::Deflated).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(buf.into_inner())).unwrap();
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

        let mut sst = String::new();
        archive
            .by_name(SHARED_STRINGS_PART)
            .unwrap()
            .read_to_string(&mut sst)
            .unwrap();
        assert_eq!(sst, parts.get(SHARED_STRINGS_PART).unwrap().xml);
    }

    #[test]
    fn interrupted_assembly_leaves_target_and_cleans_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("records.xlsx");
        fs::write(&target, b"previous contents").unwrap();

        let scratch = stage_scratch_tree(&parts(), Some(&dir.path().join("scratch"))).unwrap();
        let scratch_path = scratch.path().to_path_buf();
        let result = recordbook_fs::atomic_write(&target, |file| {
            zip_scratch_tree(&mut *file, scratch.path(), CompressionMethod::Deflated)?;
            Err::<(), WriteFailure>(io::Error::other("interrupted").into())
        });
        assert!(matches!(result, Err(AtomicWriteError::Writer(_))));
        drop(scratch);

        assert_eq!(fs::read(&target).unwrap(), b"previous contents");
        assert!(!scratch_path.exists());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 2, "{leftovers:?}");
    }

    #[test]
    fn scratch_root_is_created_and_emptied() {
        let dir = tempfile::tempdir().unwrap();
        let scratch_root = dir.path().join("nested").join("scratch");
        let target = dir.path().join("out.xlsx");
        let options = WriteOptions::default().with_scratch_root(&scratch_root);

        let written = write_package(&target, &parts(), 1, &options).unwrap();
        assert_eq!(written, 1);
        assert!(target.is_file());
        assert_eq!(fs::read_dir(&scratch_root).unwrap().count(), 0);
    }

    #[test]
    fn creator_option_reaches_core_properties() {
        let core = |options: &WriteOptions| {
            let parts = build_parts(&["h".to_string()], &[], options).unwrap();
            parts.get(CORE_PROPS_PART).unwrap().xml.clone()
        };
        let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let xml = core(&WriteOptions::default().with_timestamp(stamp));
        assert!(xml.contains("<dc:creator>recordbook-xlsx</dc:creator>"), "{xml}");

        let xml = core(&WriteOptions::default().with_timestamp(stamp).with_creator("Payroll"));
        assert!(xml.contains("<dc:creator>Payroll</dc:creator>"), "{xml}");
    }
}
