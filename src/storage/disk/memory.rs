//! In-memory block store for testing.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{BlockStore, IoStats, IoStatsSnapshot};
use crate::storage::block_id::BlockId;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::Page;

/// Keeps every file as a vector of blocks. Nothing survives a drop, but the
/// same store can be shared by several managers to simulate a restart.
pub struct MemoryStore {
    block_size: usize,
    files: Mutex<HashMap<String, Vec<Vec<u8>>>>,
    stats: IoStats,
}

impl MemoryStore {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            files: Mutex::new(HashMap::new()),
            stats: IoStats::default(),
        }
    }

    fn check_page(&self, page: &Page) -> StorageResult<()> {
        if page.len() != self.block_size {
            return Err(StorageError::BlockSizeMismatch {
                expected: self.block_size,
                actual: page.len(),
            });
        }
        Ok(())
    }
}

impl BlockStore for MemoryStore {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read(&self, block: &BlockId, page: &mut Page) -> StorageResult<()> {
        self.check_page(page)?;

        let files = self.files.lock();
        let stored = files
            .get(block.filename())
            .and_then(|blocks| blocks.get(block.number() as usize));
        match stored {
            Some(data) => page.contents_mut().copy_from_slice(data),
            None => page.contents_mut().fill(0),
        }

        self.stats.record_read();
        Ok(())
    }

    fn write(&self, block: &BlockId, page: &Page) -> StorageResult<()> {
        self.check_page(page)?;

        let mut files = self.files.lock();
        let blocks = files.entry(block.filename().to_string()).or_default();
        let index = block.number() as usize;
        if blocks.len() <= index {
            blocks.resize(index + 1, vec![0u8; self.block_size]);
        }
        blocks[index].copy_from_slice(page.contents());

        self.stats.record_write();
        Ok(())
    }

    fn append(&self, filename: &str) -> StorageResult<BlockId> {
        let mut files = self.files.lock();
        let blocks = files.entry(filename.to_string()).or_default();
        blocks.push(vec![0u8; self.block_size]);

        self.stats.record_write();
        Ok(BlockId::new(filename, blocks.len() as u64 - 1))
    }

    fn length(&self, filename: &str) -> StorageResult<u64> {
        let files = self.files.lock();
        Ok(files.get(filename).map_or(0, |blocks| blocks.len() as u64))
    }

    fn stats(&self) -> IoStatsSnapshot {
        self.stats.snapshot()
    }
}
