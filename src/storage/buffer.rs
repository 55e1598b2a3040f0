//! Buffer pool manager.
//!
//! A fixed number of [`Buffer`] slots cache blocks in memory. Callers pin a
//! block to get a [`PinnedBuffer`] handle; while any handle for a slot is
//! alive the slot is never reassigned. When every slot is pinned, `pin`
//! waits for an unpin up to the pool's maximum wait and then fails with
//! [`StorageError::PoolExhausted`].
//!
//! Lock order: the pool state mutex is taken before any buffer mutex. A
//! buffer whose pin count is zero has no live handle, so the pool can lock
//! it during replacement without contention.

pub mod first_unpinned;
pub mod frame;
pub mod lru;
pub mod replacer;

pub use frame::{Buffer, TxId};
pub use replacer::{FrameId, ReplacementPolicy, Replacer};

use crate::storage::block_id::BlockId;
use crate::storage::disk::BlockStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::wal::LogManager;
use log::{trace, warn};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long `pin` waits for a free buffer before giving up.
pub const DEFAULT_MAX_PIN_WAIT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct BufferPoolManager {
    inner: Arc<BufferPoolInner>,
}

struct BufferPoolInner {
    store: Arc<dyn BlockStore>,
    log: Arc<LogManager>,
    buffers: Vec<Mutex<Buffer>>,
    state: Mutex<PoolState>,
    /// Signalled whenever a frame's pin count drops to zero.
    frame_released: Condvar,
    max_wait: Duration,
}

struct PoolState {
    page_table: HashMap<BlockId, FrameId>,
    pin_counts: Vec<u32>,
    replacer: Box<dyn Replacer>,
}

impl BufferPoolManager {
    pub fn new(
        store: Arc<dyn BlockStore>,
        log: Arc<LogManager>,
        capacity: usize,
        policy: ReplacementPolicy,
        max_wait: Duration,
    ) -> Self {
        let block_size = store.block_size();
        Self {
            inner: Arc::new(BufferPoolInner {
                store,
                log,
                buffers: (0..capacity)
                    .map(|_| Mutex::new(Buffer::new(block_size)))
                    .collect(),
                state: Mutex::new(PoolState {
                    page_table: HashMap::with_capacity(capacity),
                    pin_counts: vec![0; capacity],
                    replacer: policy.build(capacity),
                }),
                frame_released: Condvar::new(),
                max_wait,
            }),
        }
    }

    /// Pins `block`, loading it into a free slot if it is not resident.
    ///
    /// Blocks while every slot is pinned; fails with `PoolExhausted` when no
    /// slot frees up within the pool's maximum wait.
    pub fn pin(&self, block: &BlockId) -> StorageResult<PinnedBuffer> {
        let deadline = Instant::now() + self.inner.max_wait;
        let mut state = self.inner.state.lock();
        loop {
            if let Some(frame_id) = self.inner.try_to_pin(&mut state, block)? {
                return Ok(PinnedBuffer {
                    inner: self.inner.clone(),
                    frame_id,
                    block: block.clone(),
                });
            }
            if Instant::now() >= deadline {
                warn!(
                    "No buffer available for {} after {:?}",
                    block, self.inner.max_wait
                );
                return Err(StorageError::PoolExhausted {
                    waited: self.inner.max_wait,
                });
            }
            // Wakeups may be spurious; the loop re-checks.
            self.inner.frame_released.wait_until(&mut state, deadline);
        }
    }

    /// Releases one pin. Equivalent to dropping the handle.
    pub fn unpin(&self, buffer: PinnedBuffer) {
        drop(buffer);
    }

    /// Number of slots with no pins. Advisory under concurrent use.
    pub fn available(&self) -> usize {
        let state = self.inner.state.lock();
        state.pin_counts.iter().filter(|&&count| count == 0).count()
    }

    pub fn capacity(&self) -> usize {
        self.inner.buffers.len()
    }

    /// Writes back every buffer modified by `tx`, pinned or not.
    ///
    /// Must not be called while holding a lock on one of this pool's buffers.
    pub fn flush_all(&self, tx: TxId) -> StorageResult<()> {
        for buffer in &self.inner.buffers {
            let mut buffer = buffer.lock();
            if buffer.modifying_tx() == Some(tx) {
                buffer.flush(self.inner.store.as_ref(), &self.inner.log)?;
            }
        }
        Ok(())
    }
}

impl BufferPoolInner {
    fn try_to_pin(&self, state: &mut PoolState, block: &BlockId) -> StorageResult<Option<FrameId>> {
        let resident = state.page_table.get(block).copied();
        let frame_id = match resident {
            Some(frame_id) => frame_id,
            None => {
                let Some(frame_id) = state.replacer.evict() else {
                    return Ok(None);
                };
                if let Err(e) = self.load(state, frame_id, block) {
                    state.replacer.unpin(frame_id);
                    return Err(e);
                }
                frame_id
            }
        };

        if state.pin_counts[frame_id] == 0 {
            state.replacer.pin(frame_id);
        }
        state.pin_counts[frame_id] += 1;
        Ok(Some(frame_id))
    }

    /// Reassigns an unpinned frame to `block`, writing back its old contents.
    fn load(&self, state: &mut PoolState, frame_id: FrameId, block: &BlockId) -> StorageResult<()> {
        let mut buffer = self.buffers[frame_id].lock();
        // The old mapping stays valid if the write-back fails.
        buffer.flush(self.store.as_ref(), &self.log)?;
        if let Some(old) = buffer.block() {
            trace!("Frame {}: replacing {} with {}", frame_id, old, block);
            state.page_table.remove(old);
        }
        buffer.assign_to_block(block.clone(), self.store.as_ref())?;
        state.page_table.insert(block.clone(), frame_id);
        Ok(())
    }

    fn unpin(&self, frame_id: FrameId) {
        let mut state = self.state.lock();
        debug_assert!(state.pin_counts[frame_id] > 0, "unpin of unpinned frame");
        state.pin_counts[frame_id] -= 1;
        if state.pin_counts[frame_id] == 0 {
            state.replacer.unpin(frame_id);
            self.frame_released.notify_all();
        }
    }
}

/// A pin on one buffer. Dropping the handle unpins it.
///
/// Pinning the same block twice yields two handles on the same buffer.
pub struct PinnedBuffer {
    inner: Arc<BufferPoolInner>,
    frame_id: FrameId,
    block: BlockId,
}

impl PinnedBuffer {
    pub fn block(&self) -> &BlockId {
        &self.block
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Locks the buffer for reading or writing its page and metadata.
    pub fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.inner.buffers[self.frame_id].lock()
    }
}

impl Drop for PinnedBuffer {
    fn drop(&mut self) {
        self.inner.unpin(self.frame_id);
    }
}
