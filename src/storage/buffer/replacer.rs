use std::fmt::Debug;

use super::first_unpinned::FirstUnpinnedReplacer;
use super::lru::LruReplacer;

/// Index of a buffer slot in the pool.
pub type FrameId = usize;

pub trait Replacer: Send + Sync + Debug {
    /// Select a frame to evict. Returns None if no frame can be evicted.
    fn evict(&mut self) -> Option<FrameId>;

    /// Mark a frame as pinned (not evictable).
    fn pin(&mut self, frame_id: FrameId);

    /// Mark a frame as unpinned (evictable).
    fn unpin(&mut self, frame_id: FrameId);

    /// Get the number of evictable frames.
    fn size(&self) -> usize;
}

/// Which unpinned frame the pool reuses when a block is not resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacementPolicy {
    /// Lowest-numbered unpinned frame.
    #[default]
    FirstUnpinned,
    /// Frame unpinned longest ago.
    Lru,
}

impl ReplacementPolicy {
    /// Builds a replacer with every frame of a `capacity`-sized pool evictable.
    pub fn build(self, capacity: usize) -> Box<dyn Replacer> {
        let mut replacer: Box<dyn Replacer> = match self {
            ReplacementPolicy::FirstUnpinned => Box::new(FirstUnpinnedReplacer::new()),
            ReplacementPolicy::Lru => Box::new(LruReplacer::new(capacity)),
        };
        for frame_id in 0..capacity {
            replacer.unpin(frame_id);
        }
        replacer
    }
}
