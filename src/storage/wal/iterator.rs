use std::sync::Arc;

use super::read_boundary;
use crate::storage::block_id::BlockId;
use crate::storage::disk::BlockStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{Page, INT_SIZE};

/// Walks the log from the newest record to the oldest.
///
/// The iterator reads blocks into its own page, so appends made while it is
/// running never disturb it; they are simply not visited.
pub struct LogIterator {
    store: Arc<dyn BlockStore>,
    block: BlockId,
    page: Page,
    /// Read cursor inside `page`; equals the page length once the block is used up.
    position: usize,
    failed: bool,
}

impl LogIterator {
    pub(crate) fn new(store: Arc<dyn BlockStore>, block: BlockId) -> StorageResult<Self> {
        let page = Page::new(store.block_size());
        let mut iter = Self {
            store,
            block: block.clone(),
            page,
            position: 0,
            failed: false,
        };
        iter.move_to_block(block)?;
        Ok(iter)
    }

    /// Whether more records may follow: the current block has unread records,
    /// or earlier blocks remain.
    ///
    /// Earlier blocks are not inspected, so this can return `true` when every
    /// remaining block is empty; `next` then returns `None`.
    pub fn has_next(&self) -> bool {
        !self.failed && (self.position < self.page.len() || self.block.number() > 0)
    }

    pub fn current_block(&self) -> &BlockId {
        &self.block
    }

    fn move_to_block(&mut self, block: BlockId) -> StorageResult<()> {
        self.store.read(&block, &mut self.page)?;
        self.position = read_boundary(&block, &self.page)?;
        self.block = block;
        Ok(())
    }

    fn read_record(&mut self) -> StorageResult<Vec<u8>> {
        let corrupt = || StorageError::CorruptLogBlock {
            block: self.block.clone(),
            offset: self.position,
        };
        // The header itself must fit before it can be read.
        if self.position + INT_SIZE > self.page.len() {
            return Err(corrupt());
        }
        let len = self.page.get_int(self.position);
        let end = self.position + INT_SIZE + len.max(0) as usize;
        if len < 0 || end > self.page.len() {
            return Err(corrupt());
        }
        let record = self.page.get_bytes(self.position).to_vec();
        self.position = end;
        Ok(record)
    }
}

impl Iterator for LogIterator {
    type Item = StorageResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        // Blocks without records are skipped.
        while self.position >= self.page.len() {
            let previous = self.block.previous()?;
            if let Err(e) = self.move_to_block(previous) {
                self.failed = true;
                return Some(Err(e));
            }
        }

        let record = self.read_record();
        if record.is_err() {
            self.failed = true;
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::disk::MemoryStore;
    use crate::storage::wal::LogManager;
    use anyhow::Result;

    #[test]
    fn test_has_next_tracks_blocks() -> Result<()> {
        let store = Arc::new(MemoryStore::new(32));
        let log = LogManager::new(store, "log")?;
        // 12 bytes framed, two per block.
        for i in 0..5u8 {
            log.append(&[i; 8])?;
        }

        let mut iter = log.iterator()?;
        assert_eq!(iter.current_block().number(), 2);

        let mut seen = Vec::new();
        while iter.has_next() {
            seen.push(iter.next().expect("has_next promised a record")?[0]);
        }
        assert_eq!(seen, vec![4, 3, 2, 1, 0]);
        assert_eq!(iter.current_block().number(), 0);
        assert!(iter.next().is_none());
        Ok(())
    }

    #[test]
    fn test_appends_after_creation_are_not_visited() -> Result<()> {
        let store = Arc::new(MemoryStore::new(64));
        let log = LogManager::new(store, "log")?;
        log.append(b"old")?;

        let iter = log.iterator()?;
        log.append(b"new")?;
        log.flush(log.latest_lsn())?;

        let records = iter.collect::<StorageResult<Vec<_>>>()?;
        assert_eq!(records, vec![b"old".to_vec()]);
        Ok(())
    }

    #[test]
    fn test_skips_empty_tail_block() -> Result<()> {
        let store = Arc::new(MemoryStore::new(32));
        let mut page = Page::new(32);
        page.set_int(0, 32 - 7);
        page.set_bytes(32 - 7, b"abc");
        store.write(&BlockId::new("log", 0), &page)?;
        // Allocated by a rollover, never initialized.
        store.append("log")?;

        let iter = LogIterator::new(store, BlockId::new("log", 1))?;
        assert!(iter.has_next());
        let records = iter.collect::<StorageResult<Vec<_>>>()?;
        assert_eq!(records, vec![b"abc".to_vec()]);
        Ok(())
    }

    #[test]
    fn test_record_header_past_block_end() -> Result<()> {
        let store = Arc::new(MemoryStore::new(32));
        let mut page = Page::new(32);
        // An empty record at 26 leaves the cursor at 30, two bytes short of a header.
        page.set_int(0, 26);
        page.set_int(26, 0);
        store.write(&BlockId::new("log", 0), &page)?;

        let mut iter = LogIterator::new(store, BlockId::new("log", 0))?;
        assert_eq!(iter.next().transpose()?, Some(Vec::new()));
        assert!(matches!(
            iter.next(),
            Some(Err(StorageError::CorruptLogBlock { offset: 30, .. }))
        ));
        assert!(iter.next().is_none());
        Ok(())
    }

    #[test]
    fn test_boundary_without_room_for_header() -> Result<()> {
        let store = Arc::new(MemoryStore::new(32));
        let mut page = Page::new(32);
        page.set_int(0, 30);
        store.write(&BlockId::new("log", 0), &page)?;

        let result = LogIterator::new(store.clone(), BlockId::new("log", 0));
        assert!(matches!(
            result,
            Err(StorageError::CorruptLogBlock { offset: 0, .. })
        ));

        // A boundary at the block end is an empty block, not corruption.
        page.set_int(0, 32);
        store.write(&BlockId::new("log", 0), &page)?;
        let iter = LogIterator::new(store, BlockId::new("log", 0))?;
        assert_eq!(iter.collect::<StorageResult<Vec<_>>>()?, Vec::<Vec<u8>>::new());
        Ok(())
    }

    #[test]
    fn test_corrupt_record_length() -> Result<()> {
        let store = Arc::new(MemoryStore::new(32));
        let mut page = Page::new(32);
        page.set_int(0, 20);
        page.set_int(20, 100);
        store.write(&BlockId::new("log", 0), &page)?;

        let mut iter = LogIterator::new(store, BlockId::new("log", 0))?;
        assert!(matches!(
            iter.next(),
            Some(Err(StorageError::CorruptLogBlock { offset: 20, .. }))
        ));
        assert!(iter.next().is_none());
        assert!(!iter.has_next());
        Ok(())
    }
}
