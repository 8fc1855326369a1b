use std::path::PathBuf;

use cairn_types::{Cid, TypeError};

/// Errors from block store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested block was not found.
    #[error("block not found: {0}")]
    NotFound(Cid),

    /// The backend refused or failed to persist a block.
    #[error("failed to write block {cid}: {reason}")]
    WriteFailure { cid: Cid, reason: String },

    /// Stored bytes no longer hash to their identifier (data corruption).
    #[error("hash mismatch for {cid}: stored bytes hash to {computed}")]
    HashMismatch { cid: Cid, computed: String },

    /// Pin set persistence failure.
    #[error("serialization error in {path}: {reason}")]
    Serialization { path: PathBuf, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller supplied an identifier or prefix that cannot be used.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
