//! Log manager implementation.
//!
//! The log manager keeps the tail block of the log file in memory, appends
//! records to it, and writes it back when a caller asks for durability or
//! when the block fills up.

use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use super::iterator::LogIterator;
use super::lsn::Lsn;
use super::{read_boundary, BOUNDARY_OFFSET};
use crate::storage::block_id::BlockId;
use crate::storage::disk::BlockStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{Page, INT_SIZE};

const MIN_BLOCK_SIZE: usize = 2 * INT_SIZE;

/// Tail of the log, guarded as a unit so appends never interleave.
struct LogTail {
    /// In-memory image of `current_block`.
    page: Page,
    current_block: BlockId,
    /// Highest LSN handed out so far.
    latest_lsn: Lsn,
    /// All records up to this LSN are on disk.
    last_saved_lsn: Lsn,
}

pub struct LogManager {
    store: Arc<dyn BlockStore>,
    log_file: String,
    tail: Mutex<LogTail>,
}

impl LogManager {
    /// Opens the log stored in `log_file`, creating its first block if the
    /// file is empty.
    ///
    /// A log block needs room for the boundary and at least one record header.
    pub fn new(store: Arc<dyn BlockStore>, log_file: impl Into<String>) -> StorageResult<Self> {
        if store.block_size() < MIN_BLOCK_SIZE {
            return Err(StorageError::BlockTooSmall {
                block_size: store.block_size(),
                minimum: MIN_BLOCK_SIZE,
            });
        }
        let log_file = log_file.into();
        let mut page = Page::new(store.block_size());

        let log_size = store.length(&log_file)?;
        let current_block = if log_size == 0 {
            Self::append_new_block(store.as_ref(), &log_file, &mut page)?
        } else {
            let block = BlockId::new(log_file.clone(), log_size - 1);
            store.read(&block, &mut page)?;
            let boundary = read_boundary(&block, &page)?;
            page.set_int(BOUNDARY_OFFSET, boundary as i32);
            block
        };
        debug!("Log {} positioned at {}", log_file, current_block);

        Ok(Self {
            store,
            log_file,
            tail: Mutex::new(LogTail {
                page,
                current_block,
                latest_lsn: Lsn::ZERO,
                last_saved_lsn: Lsn::ZERO,
            }),
        })
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    /// Appends a record and returns its LSN.
    ///
    /// The record is not durable until a `flush` covering its LSN returns.
    pub fn append(&self, record: &[u8]) -> StorageResult<Lsn> {
        let block_size = self.store.block_size();
        let capacity = block_size - MIN_BLOCK_SIZE;
        if record.len() > capacity {
            return Err(StorageError::RecordTooLarge {
                size: record.len(),
                capacity,
            });
        }
        let bytes_needed = INT_SIZE + record.len();

        let mut tail = self.tail.lock();
        let mut boundary = tail.page.get_int(BOUNDARY_OFFSET) as usize;
        if boundary < INT_SIZE + bytes_needed {
            // Doesn't fit, so move to the next block.
            self.write_tail(&mut tail)?;
            let block = Self::append_new_block(self.store.as_ref(), &self.log_file, &mut tail.page)?;
            debug!("Log rolled over to {}", block);
            tail.current_block = block;
            boundary = block_size;
        }

        let offset = boundary - bytes_needed;
        tail.page.set_bytes(offset, record);
        tail.page.set_int(BOUNDARY_OFFSET, offset as i32);
        tail.latest_lsn = tail.latest_lsn.next();
        Ok(tail.latest_lsn)
    }

    /// Makes every record up to `lsn` durable. Returns without I/O when
    /// `lsn` is already covered.
    pub fn flush(&self, lsn: Lsn) -> StorageResult<()> {
        let mut tail = self.tail.lock();
        if lsn > tail.last_saved_lsn {
            self.write_tail(&mut tail)?;
        }
        Ok(())
    }

    /// Returns the records newest first. Everything appended so far is
    /// flushed before the iterator is created.
    pub fn iterator(&self) -> StorageResult<LogIterator> {
        let current_block = {
            let mut tail = self.tail.lock();
            self.write_tail(&mut tail)?;
            tail.current_block.clone()
        };
        LogIterator::new(self.store.clone(), current_block)
    }

    pub fn latest_lsn(&self) -> Lsn {
        self.tail.lock().latest_lsn
    }

    pub fn last_saved_lsn(&self) -> Lsn {
        self.tail.lock().last_saved_lsn
    }

    fn write_tail(&self, tail: &mut LogTail) -> StorageResult<()> {
        self.store.write(&tail.current_block, &tail.page)?;
        tail.last_saved_lsn = tail.latest_lsn;
        Ok(())
    }

    fn append_new_block(
        store: &dyn BlockStore,
        log_file: &str,
        page: &mut Page,
    ) -> StorageResult<BlockId> {
        let block = store.append(log_file)?;
        page.contents_mut().fill(0);
        page.set_int(BOUNDARY_OFFSET, store.block_size() as i32);
        store.write(&block, page)?;
        Ok(block)
    }
}
