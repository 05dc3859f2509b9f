use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::cell_ref::CellRefError;
use crate::shared_strings::SharedStringsError;
use crate::worksheet::WorksheetError;

/// Errors surfaced by [`crate::write`] and [`crate::read`].
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("malformed cell reference: {0}")]
    MalformedReference(#[from] CellRefError),
    #[error("not a valid spreadsheet container: {}: {source}", path.display())]
    PackageOpenFailure {
        path: PathBuf,
        #[source]
        source: OpenFailure,
    },
    #[error("failed to write {} during {step}: {source}", path.display())]
    PackageWriteFailure {
        path: PathBuf,
        step: WriteStep,
        #[source]
        source: WriteFailure,
    },
    #[error("missing required part: {0}")]
    MissingPart(String),
}

impl XlsxError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: impl Into<OpenFailure>) -> Self {
        Self::PackageOpenFailure {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(
        path: impl Into<PathBuf>,
        step: WriteStep,
        source: impl Into<WriteFailure>,
    ) -> Self {
        Self::PackageWriteFailure {
            path: path.into(),
            step,
            source: source.into(),
        }
    }
}

/// Why a container could not be opened or one of its parts could not be parsed.
#[derive(Debug, Error)]
pub enum OpenFailure {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to parse {part}: {source}")]
    SharedStrings {
        part: String,
        #[source]
        source: SharedStringsError,
    },
    #[error("failed to parse {part}: {source}")]
    Worksheet {
        part: String,
        #[source]
        source: WorksheetError,
    },
    #[error("xml parse error in {part}: {source}")]
    Dom {
        part: String,
        #[source]
        source: roxmltree::Error,
    },
    #[error("part {part} is not valid UTF-8: {source}")]
    NonUtf8 {
        part: String,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("part {part} is too large ({size} bytes, max {max})")]
    PartTooLarge { part: String, size: u64, max: u64 },
}

/// The assembler step during which a write failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteStep {
    /// Serializing parts into the scratch working tree.
    Scratch,
    /// Copying the pre-existing target aside.
    Backup,
    /// Building the archive at the temporary sibling path.
    Assemble,
    /// Renaming the finished archive over the target.
    Commit,
}

impl WriteStep {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteStep::Scratch => "scratch",
            WriteStep::Backup => "backup",
            WriteStep::Assemble => "assemble",
            WriteStep::Commit => "commit",
        }
    }
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum WriteFailure {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
