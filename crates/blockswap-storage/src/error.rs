//! Storage error types

use blockswap_primitives::Cid;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Block not found
    #[error("block not found: {0}")]
    NotFound(Cid),

    /// Backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
