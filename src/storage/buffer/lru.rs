use super::replacer::{FrameId, Replacer};
use std::collections::VecDeque;

#[derive(Debug)]
pub struct LruReplacer {
    /// Evictable frames, least recently unpinned at the front.
    lru_list: VecDeque<FrameId>,
    /// Maximum number of frames
    max_size: usize,
}

impl LruReplacer {
    pub fn new(max_size: usize) -> Self {
        Self {
            lru_list: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    fn position(&self, frame_id: FrameId) -> Option<usize> {
        self.lru_list.iter().position(|&f| f == frame_id)
    }
}

impl Replacer for LruReplacer {
    fn evict(&mut self) -> Option<FrameId> {
        self.lru_list.pop_front()
    }

    fn pin(&mut self, frame_id: FrameId) {
        if let Some(idx) = self.position(frame_id) {
            self.lru_list.remove(idx);
        }
    }

    fn unpin(&mut self, frame_id: FrameId) {
        if self.position(frame_id).is_none() && self.lru_list.len() < self.max_size {
            self.lru_list.push_back(frame_id);
        }
    }

    fn size(&self) -> usize {
        self.lru_list.len()
    }
}
