//! Block-addressed storage underneath the buffer pool and the log.
//!
//! Every operation moves a whole block; partial-block I/O is not supported.

pub mod file_manager;
pub mod memory;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::storage::block_id::BlockId;
use crate::storage::error::StorageResult;
use crate::storage::page::Page;

pub use file_manager::FileManager;
pub use memory::MemoryStore;

pub trait BlockStore: Send + Sync {
    /// Size in bytes of every block of every file in this store.
    fn block_size(&self) -> usize;

    /// Copies the block's bytes into `page`. A block that was never written
    /// reads as zeros.
    fn read(&self, block: &BlockId, page: &mut Page) -> StorageResult<()>;

    /// Writes `page` as the block's new contents, extending the file if needed.
    fn write(&self, block: &BlockId, page: &Page) -> StorageResult<()>;

    /// Extends `filename` by one zero-filled block and returns its id.
    fn append(&self, filename: &str) -> StorageResult<BlockId>;

    /// Number of blocks in `filename`.
    fn length(&self, filename: &str) -> StorageResult<u64>;

    fn stats(&self) -> IoStatsSnapshot;
}

/// Block I/O counters kept by a store.
#[derive(Debug, Default)]
pub struct IoStats {
    blocks_read: AtomicU64,
    blocks_written: AtomicU64,
}

impl IoStats {
    pub fn record_read(&self) {
        self.blocks_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.blocks_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IoStatsSnapshot {
        IoStatsSnapshot {
            blocks_read: self.blocks_read.load(Ordering::Relaxed),
            blocks_written: self.blocks_written.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoStatsSnapshot {
    pub blocks_read: u64,
    pub blocks_written: u64,
}
