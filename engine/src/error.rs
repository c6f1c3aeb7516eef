//! Error types for the sync engine.

use crate::RecordId;
use thiserror::Error;

/// Input errors raised by the engine itself.
///
/// None of these are retryable: the same input always fails the same way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed bookmark: {0}")]
    MalformedBookmark(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("revision chain through '{0}' loops back on itself")]
    BrokenRevisionChain(RecordId),
}

/// Failure of a sync request.
///
/// Persistence failures come through `Source` untouched; the engine performs
/// no writes, so callers may retry those as-is.
#[derive(Debug, Error)]
pub enum SyncError<E> {
    #[error(transparent)]
    Engine(#[from] Error),

    #[error("record source failed: {0}")]
    Source(#[source] E),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
