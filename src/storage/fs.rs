//! File-based record storage.
//!
//! One JSON file per save, named so lexicographic order is load order:
//! `<YYYYMMDDhhmmss>-<6 lowercase alnum>.json` under the per-file log
//! directory of either the repository layout (`<workspace>/.tabd/log/...`)
//! or the home-directory layout.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, warn};

use super::error::StorageError;
use super::wire::LogRecord;
use crate::core::WallClock;
use crate::paths;

const SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 6;

/// Which directory tree record files live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsLayout {
    Repository,
    HomeDirectory,
}

impl FsLayout {
    fn log_root(self, workspace: &Path) -> PathBuf {
        match self {
            FsLayout::Repository => paths::workspace_log_root(workspace),
            FsLayout::HomeDirectory => paths::home_log_root(workspace),
        }
    }
}

/// Per-file log directory for `relative` within `workspace`.
pub fn record_dir(layout: FsLayout, workspace: &Path, relative: &Path) -> PathBuf {
    layout.log_root(workspace).join(relative)
}

/// Write one record file. Fails on a path collision instead of
/// overwriting an existing record.
pub fn save_record(
    layout: FsLayout,
    workspace: &Path,
    relative: &Path,
    record: &LogRecord,
) -> Result<PathBuf, StorageError> {
    let dir = record_dir(layout, workspace, relative);
    fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

    let path = dir.join(record_file_name(WallClock::now()));
    if path.exists() {
        return Err(StorageError::PathCollision { path });
    }

    let body = record.encode()?;
    fs::write(&path, body).map_err(|e| StorageError::io(&path, e))?;
    debug!(path = %path.display(), changes = record.changes.len(), "record written");
    Ok(path)
}

/// Load every record for `relative`, oldest file first. Malformed or
/// unsupported files are skipped with a warning.
pub fn load_records(
    layout: FsLayout,
    workspace: &Path,
    relative: &Path,
) -> Result<Vec<LogRecord>, StorageError> {
    let dir = record_dir(layout, workspace, relative);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names: Vec<PathBuf> = fs::read_dir(&dir)
        .map_err(|e| StorageError::io(&dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    names.sort();

    let mut records = Vec::with_capacity(names.len());
    for path in names {
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable record skipped");
                continue;
            }
        };
        match LogRecord::decode(&raw) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "malformed record skipped");
            }
        }
    }
    Ok(records)
}

/// `<YYYYMMDDhhmmss>-<6 lowercase alnum>.json`, timestamp-sortable.
fn record_file_name(now: WallClock) -> String {
    let stamp = OffsetDateTime::from_unix_timestamp((now.0 / 1_000) as i64)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .format(format_description!(
            "[year][month][day][hour][minute][second]"
        ))
        .unwrap_or_else(|_| "00000000000000".to_string());

    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARS[rng.random_range(0..SUFFIX_CHARS.len())] as char)
        .collect();

    format!("{stamp}-{suffix}.json")
}
