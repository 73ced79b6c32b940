//! Record persistence.
//!
//! Three layouts behind one dispatch type: per-workspace JSON files,
//! home-directory JSON files, and git notes. Loading tolerates malformed
//! records; saving refuses to clobber an existing record path.

pub mod error;
pub mod fs;
pub mod notes;
pub mod wire;

use std::path::{Path, PathBuf};

pub use error::StorageError;
pub use wire::{DecodeError, LogRecord, WireChange, checksum_hex};

use crate::config::{StorageConfig, StorageLayout};
use crate::vcs;

/// Layout dispatch for one storage configuration.
#[derive(Clone, Debug)]
pub struct Storage {
    layout: StorageLayout,
    notes_push: bool,
    notes_fetch: bool,
}

impl Storage {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            layout: config.layout,
            notes_push: config.notes_push,
            notes_fetch: config.notes_fetch,
        }
    }

    pub fn layout(&self) -> StorageLayout {
        self.layout
    }

    /// Persist one record for the document at `file`.
    pub fn save(&self, file: &Path, record: &LogRecord) -> Result<(), StorageError> {
        let (workspace, relative) = split_workspace(file)?;
        match self.layout {
            StorageLayout::Repository => {
                fs::save_record(fs::FsLayout::Repository, &workspace, &relative, record)?;
            }
            StorageLayout::HomeDirectory => {
                fs::save_record(fs::FsLayout::HomeDirectory, &workspace, &relative, record)?;
            }
            StorageLayout::VcsNotes => {
                notes::save_record(&workspace, &relative, record, self.notes_push)?;
            }
        }
        Ok(())
    }

    /// Load all persisted records for the document at `file`, oldest first.
    pub fn load(&self, file: &Path) -> Result<Vec<LogRecord>, StorageError> {
        let (workspace, relative) = split_workspace(file)?;
        match self.layout {
            StorageLayout::Repository => {
                fs::load_records(fs::FsLayout::Repository, &workspace, &relative)
            }
            StorageLayout::HomeDirectory => {
                fs::load_records(fs::FsLayout::HomeDirectory, &workspace, &relative)
            }
            StorageLayout::VcsNotes => notes::load_records(&workspace, &relative, self.notes_fetch),
        }
    }
}

/// Resolve `file` into its workspace root and workspace-relative path.
fn split_workspace(file: &Path) -> Result<(PathBuf, PathBuf), StorageError> {
    let workspace = vcs::workspace_root(file).ok_or_else(|| StorageError::Unavailable {
        path: file.to_path_buf(),
    })?;
    let relative = file
        .strip_prefix(&workspace)
        .map(Path::to_path_buf)
        .map_err(|_| StorageError::Unavailable {
            path: file.to_path_buf(),
        })?;
    Ok((workspace, relative))
}
