use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::value::ValueMode;
use crate::zip_util::DEFAULT_MAX_ZIP_PART_BYTES;

/// Configuration for [`crate::write_with_options`].
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Mode applied to every column without an explicit entry in `column_modes`.
    pub default_mode: ValueMode,
    /// Per-column overrides, keyed by header name.
    pub column_modes: BTreeMap<String, ValueMode>,
    /// Copy a pre-existing target aside before replacing it.
    pub backup: bool,
    /// Store entries Deflate-compressed (`true`) or uncompressed.
    pub compress: bool,
    /// Timestamp written to the document properties. `None` uses the current time.
    ///
    /// Fixing this makes repeated writes of the same table byte-identical.
    pub timestamp: Option<DateTime<Utc>>,
    /// Directory under which the scratch working tree is created. `None` uses the system temp
    /// directory.
    pub scratch_root: Option<PathBuf>,
    /// `dc:creator` recorded in `docProps/core.xml`. `None` records the library name.
    pub creator: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            default_mode: ValueMode::InferNumeric,
            column_modes: BTreeMap::new(),
            backup: true,
            compress: true,
            timestamp: None,
            scratch_root: None,
            creator: None,
        }
    }
}

impl WriteOptions {
    /// Store the named column's text verbatim instead of inferring numbers.
    pub fn force_string(mut self, header: impl Into<String>) -> Self {
        self.column_modes.insert(header.into(), ValueMode::ForceString);
        self
    }

    pub fn with_default_mode(mut self, mode: ValueMode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// The mode for the column with the given header (`None` for columns beyond the headers).
    pub(crate) fn mode_for(&self, header: Option<&str>) -> ValueMode {
        header
            .and_then(|h| self.column_modes.get(h).copied())
            .unwrap_or(self.default_mode)
    }
}

/// Configuration for [`crate::read_with_options`].
#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Maximum uncompressed size of any single part inflated into memory.
    pub max_part_bytes: u64,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_ZIP_PART_BYTES,
        }
    }
}

impl ReadOptions {
    pub fn with_max_part_bytes(mut self, max_part_bytes: u64) -> Self {
        self.max_part_bytes = max_part_bytes;
        self
    }
}
