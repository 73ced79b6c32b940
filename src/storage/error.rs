//! Storage error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::Transience;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The chosen layout has nowhere to write (no workspace, no repo).
    #[error("no storage location for {path}")]
    Unavailable { path: PathBuf },

    /// Two save attempts resolved to the same record path.
    #[error("record path collision at {path}")]
    PathCollision { path: PathBuf },

    #[error("i/o failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git operation failed: {source}")]
    Git {
        #[from]
        source: git2::Error,
    },

    #[error("record encoding failed: {source}")]
    Encode {
        #[from]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn transience(&self) -> Transience {
        match self {
            StorageError::Unavailable { .. } | StorageError::PathCollision { .. } => {
                Transience::Permanent
            }
            StorageError::Io { .. } | StorageError::Git { .. } => Transience::Retryable,
            StorageError::Encode { .. } => Transience::Permanent,
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
