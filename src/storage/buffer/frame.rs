use log::trace;

use crate::storage::block_id::BlockId;
use crate::storage::disk::BlockStore;
use crate::storage::error::StorageResult;
use crate::storage::page::Page;
use crate::storage::wal::{LogManager, Lsn};

/// Identifier of the transaction that last modified a buffer.
pub type TxId = u64;

/// One pool slot: a page plus what is known about the block loaded into it.
///
/// The page itself is allocated once and reused; only its contents and the
/// metadata change when the slot is reassigned.
#[derive(Debug)]
pub struct Buffer {
    page: Page,
    block: Option<BlockId>,
    modifying_tx: Option<TxId>,
    lsn: Option<Lsn>,
}

impl Buffer {
    pub(crate) fn new(block_size: usize) -> Self {
        Self {
            page: Page::new(block_size),
            block: None,
            modifying_tx: None,
            lsn: None,
        }
    }

    pub fn contents(&self) -> &Page {
        &self.page
    }

    pub fn contents_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    /// Records that `tx` changed the page. `lsn` is the log record describing
    /// the change; `None` keeps the LSN recorded by an earlier change.
    pub fn set_modified(&mut self, tx: TxId, lsn: Option<Lsn>) {
        self.modifying_tx = Some(tx);
        if lsn.is_some() {
            self.lsn = lsn;
        }
    }

    pub fn modifying_tx(&self) -> Option<TxId> {
        self.modifying_tx
    }

    pub fn lsn(&self) -> Option<Lsn> {
        self.lsn
    }

    pub fn is_dirty(&self) -> bool {
        self.modifying_tx.is_some()
    }

    /// Writes the page back if it was modified. The log is flushed up to the
    /// buffer's LSN first.
    pub(crate) fn flush(&mut self, store: &dyn BlockStore, log: &LogManager) -> StorageResult<()> {
        if self.modifying_tx.is_none() {
            return Ok(());
        }
        if let Some(block) = &self.block {
            if let Some(lsn) = self.lsn {
                log.flush(lsn)?;
            }
            trace!("Writing back dirty buffer for {}", block);
            store.write(block, &self.page)?;
        }
        self.modifying_tx = None;
        Ok(())
    }

    /// Loads `block` into this slot. The previous contents must already be
    /// flushed.
    pub(crate) fn assign_to_block(
        &mut self,
        block: BlockId,
        store: &dyn BlockStore,
    ) -> StorageResult<()> {
        debug_assert!(!self.is_dirty(), "reassigning a dirty buffer");
        self.block = None;
        self.lsn = None;
        store.read(&block, &mut self.page)?;
        self.block = Some(block);
        Ok(())
    }
}
