//! Resolver error types.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use oncall_core::CodecError;
use oncall_providers::ProviderError;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Result type for resolver operations.
pub type CalendarResult<T> = Result<T, CalendarError>;

/// Errors reading or writing the local cache files.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The cache file does not exist yet.
    #[error("cache file {} does not exist", path.display())]
    Missing { path: PathBuf },

    /// The cache file exists but could not be read.
    #[error("failed to read cache file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// A line in the cache file could not be decoded.
    #[error("corrupt cache file {} at line {line}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: CodecError,
    },

    /// The cache file could not be written.
    #[error("failed to write cache file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
}

/// Errors that can occur while resolving who is on call.
///
/// Clone so that a failed sync can be replayed to every later query.
#[derive(Debug, Clone, Error)]
pub enum CalendarError {
    /// A remote call failed and there was nothing to fall back to.
    #[error("remote fetch failed: {0}")]
    RemoteFetch(#[from] ProviderError),

    /// The local cache could not be used.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Neither the remote calendar nor the local cache could be used.
    #[error("shift data unavailable: {remote}; cache: {cache}")]
    Unavailable {
        remote: ProviderError,
        #[source]
        cache: CacheError,
    },

    /// The contacts directory has no entry for a shift title.
    #[error("no contact matches {query:?}")]
    NoMatch { query: String },
}

impl CalendarError {
    /// Creates a no-match error.
    pub fn no_match(query: impl Into<String>) -> Self {
        Self::NoMatch {
            query: query.into(),
        }
    }

    /// Maps a provider error, turning an empty contact search into `NoMatch`.
    pub(crate) fn from_lookup(query: &str, error: ProviderError) -> Self {
        if error.falls_back_to_cache() {
            Self::RemoteFetch(error)
        } else {
            Self::no_match(query)
        }
    }

    /// Returns true if the error reports missing data rather than a failure.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::NoMatch { .. })
    }
}
