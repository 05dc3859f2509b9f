//! Small filesystem utilities shared across workspace crates.
//!
//! In particular, this provides helpers for replace-on-success file writes:
//! - write to a temp file in the same directory (avoids cross-device renames)
//! - flush + `sync_all`
//! - rename into place with replace semantics (including on Windows)
//!
//! and for loss-prevention backups taken before a file is replaced:
//! `{path}.backup_{YYYYMMDD_HHMMSS}`, never overwriting an earlier backup.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::NamedTempFile;

/// `strftime` pattern used for the timestamp portion of backup file names.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Infix placed between the original file name and the backup timestamp.
pub const BACKUP_INFIX: &str = ".backup_";

#[derive(Debug)]
pub enum AtomicWriteError<E> {
    /// Staging the temp file failed; the destination was not touched.
    Io(io::Error),
    /// `write_fn` failed; the destination was not touched.
    Writer(E),
    /// The final replace-rename failed.
    Replace(io::Error),
}

impl<E> From<io::Error> for AtomicWriteError<E> {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl<E: std::fmt::Display> std::fmt::Display for AtomicWriteError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicWriteError::Io(err) => write!(f, "io error: {err}"),
            AtomicWriteError::Writer(err) => write!(f, "write error: {err}"),
            AtomicWriteError::Replace(err) => write!(f, "replace error: {err}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for AtomicWriteError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AtomicWriteError::Io(err) => Some(err),
            AtomicWriteError::Writer(err) => Some(err),
            AtomicWriteError::Replace(err) => Some(err),
        }
    }
}

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` returns `Some("")` for bare relative file names like `records.xlsx`.
    // Treat that as the current directory so callers can use relative paths without
    // having to prepend `./`.
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Atomically write a file by:
/// - creating parent directories (if needed)
/// - writing to a temp file in the same directory
/// - flushing + syncing the temp file
/// - renaming it into place with replace semantics
///
/// If `write_fn` returns an error (or any step before the rename fails), the destination file is
/// left untouched and the temp file is removed.
pub fn atomic_write<T, E>(
    dest: impl AsRef<Path>,
    write_fn: impl FnOnce(&mut File) -> Result<T, E>,
) -> Result<T, AtomicWriteError<E>> {
    let dest = dest.as_ref();
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir).map_err(AtomicWriteError::Io)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(AtomicWriteError::Io)?;
    log::debug!("staging {} at {}", dest.display(), tmp.path().display());
    let out = write_fn(tmp.as_file_mut()).map_err(AtomicWriteError::Writer)?;

    tmp.as_file_mut().flush().map_err(AtomicWriteError::Io)?;
    tmp.as_file().sync_all().map_err(AtomicWriteError::Io)?;

    let tmp_path = tmp.into_temp_path();
    replace_file(tmp_path.as_ref(), dest).map_err(AtomicWriteError::Replace)?;

    // Best-effort: sync directory metadata after the rename.
    // Failures here should not be treated as a write failure (the file is already in place).
    let _ = sync_parent_dir(dest);

    Ok(out)
}

/// Convenience helper for atomically writing a full byte slice to disk.
pub fn atomic_write_bytes(dest: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    atomic_write(dest, |file| file.write_all(bytes)).map_err(|err| match err {
        AtomicWriteError::Io(err) | AtomicWriteError::Replace(err) => err,
        AtomicWriteError::Writer(err) => err,
    })
}

fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let parent = parent_dir_or_dot(path);
    // On most Unix platforms, opening a directory as a file is supported.
    // On others (or on Windows), this may fail; callers treat it as best-effort.
    let dir = File::open(parent)?;
    dir.sync_all()
}

fn replace_file(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt as _;
        use windows_sys::Win32::Storage::FileSystem::{MoveFileExW, MOVEFILE_REPLACE_EXISTING};

        fn to_wide_null(path: &Path) -> Vec<u16> {
            let mut wide: Vec<u16> = path.as_os_str().encode_wide().collect();
            wide.push(0);
            wide
        }

        let from_w = to_wide_null(from);
        let to_w = to_wide_null(to);
        let flags = MOVEFILE_REPLACE_EXISTING;
        let ok = unsafe { MoveFileExW(from_w.as_ptr(), to_w.as_ptr(), flags) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

/// Generate a sibling file path in the same directory by appending `suffix` to the file name.
pub fn sibling_path_with_suffix(path: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let path = path.as_ref();
    let dir = parent_dir_or_dot(path);
    let file_name = path.file_name().unwrap_or_default();
    dir.join(format!("{}{}", file_name.to_string_lossy(), suffix))
}

/// The backup path for `path` taken at `at`, without collision handling.
pub fn backup_path(path: impl AsRef<Path>, at: NaiveDateTime) -> PathBuf {
    let stamp = at.format(BACKUP_TIMESTAMP_FORMAT);
    sibling_path_with_suffix(path, &format!("{BACKUP_INFIX}{stamp}"))
}

/// Copy `path` aside to `{path}.backup_{YYYYMMDD_HHMMSS}` if it exists.
///
/// Returns `Ok(None)` when there is nothing to back up. Backups are never overwritten: if a
/// backup with the same timestamp already exists (two writes within one second), a `_1`, `_2`,
/// ... counter is appended. The copy is synced to disk before returning.
pub fn backup_existing(path: impl AsRef<Path>, at: NaiveDateTime) -> io::Result<Option<PathBuf>> {
    let path = path.as_ref();
    let mut source = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    if !source.metadata()?.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }

    let base = backup_path(path, at);
    let mut attempt = 0u32;
    loop {
        let candidate = if attempt == 0 {
            base.clone()
        } else {
            sibling_path_with_suffix(&base, &format!("_{attempt}"))
        };

        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut dest) => {
                let copied = match io::copy(&mut source, &mut dest).and_then(|n| {
                    dest.sync_all()?;
                    Ok(n)
                }) {
                    Ok(n) => n,
                    Err(err) => {
                        // Don't leave a truncated backup behind that looks like a good one.
                        drop(dest);
                        let _ = fs::remove_file(&candidate);
                        return Err(err);
                    }
                };
                log::debug!(
                    "backed up {} ({copied} bytes) to {}",
                    path.display(),
                    candidate.display()
                );
                return Ok(Some(candidate));
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                attempt = attempt.checked_add(1).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::AlreadyExists, "backup name space exhausted")
                })?;
            }
            Err(err) => return Err(err),
        }
    }
}

/// List existing backups of `path` (files in the same directory named `{file}.backup_*`), sorted
/// by name.
pub fn list_backups(path: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let dir = parent_dir_or_dot(path);
    let prefix = format!(
        "{}{BACKUP_INFIX}",
        path.file_name().unwrap_or_default().to_string_lossy()
    );

    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(&prefix) && entry.file_type()?.is_file() {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}
