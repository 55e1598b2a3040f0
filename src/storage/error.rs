//! Storage layer error types.

use std::time::Duration;

use thiserror::Error;

use crate::storage::block_id::BlockId;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Buffer pool exhausted: no buffer became available within {waited:?}")]
    PoolExhausted { waited: Duration },

    #[error("Log record of {size} bytes does not fit in a block (max {capacity})")]
    RecordTooLarge { size: usize, capacity: usize },

    #[error("Corrupt log block {block} at offset {offset}")]
    CorruptLogBlock { block: BlockId, offset: usize },

    #[error("Block size {block_size} is too small for a log block (min {minimum})")]
    BlockTooSmall { block_size: usize, minimum: usize },

    #[error("Page size must be the block size ({expected}), got {actual}")]
    BlockSizeMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
