use thiserror::Error;

use crate::clipboard::HelperError;
use crate::config::ConfigError;
use crate::core::OriginError;
use crate::storage::StorageError;

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// Crate-level convenience error.
///
/// A thin wrapper over the subsystem errors; in-memory tracking state is
/// never invalidated by any of these.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Helper(#[from] HelperError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Origin(#[from] OriginError),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Storage(e) => e.transience(),
            Error::Helper(e) => e.transience(),
            Error::Config(_) => Transience::Permanent,
            Error::Origin(_) => Transience::Retryable,
        }
    }
}
