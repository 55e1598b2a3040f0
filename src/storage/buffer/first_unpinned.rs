use std::collections::BTreeSet;

use super::replacer::{FrameId, Replacer};

/// Evicts the lowest-numbered unpinned frame, i.e. the first one a scan of
/// the pool would find. No recency is tracked.
#[derive(Debug, Default)]
pub struct FirstUnpinnedReplacer {
    evictable: BTreeSet<FrameId>,
}

impl FirstUnpinnedReplacer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Replacer for FirstUnpinnedReplacer {
    fn evict(&mut self) -> Option<FrameId> {
        self.evictable.pop_first()
    }

    fn pin(&mut self, frame_id: FrameId) {
        self.evictable.remove(&frame_id);
    }

    fn unpin(&mut self, frame_id: FrameId) {
        self.evictable.insert(frame_id);
    }

    fn size(&self) -> usize {
        self.evictable.len()
    }
}
