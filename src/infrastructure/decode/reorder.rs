//! Bounded per-source reorder window
//!
//! Tolerates local delivery jitter by holding up to `capacity` frames and
//! releasing the oldest half, in ascending sequence order, once the window
//! fills. Sequence numbers are unique per source, so ordering has no ties.

use crate::domain::VoiceFrame;

/// What [`ReorderBuffer::offer`] did with a frame.
#[derive(Debug)]
pub enum Offered {
    /// Frame joined the window; nothing released yet.
    Held,
    /// The window hit capacity; the oldest half is released in sequence
    /// order, oldest first.
    Released(Vec<VoiceFrame>),
    /// The frame's sequence was already passed by an earlier release; it
    /// can no longer be emitted in order and is handed back.
    Stale(VoiceFrame),
}

/// Jitter window for one source's compressed frames.
#[derive(Debug)]
pub struct ReorderBuffer {
    window: Vec<VoiceFrame>,
    capacity: usize,
    last_released: Option<u64>,
}

impl ReorderBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Vec::with_capacity(capacity),
            capacity,
            last_released: None,
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Highest sequence released so far, if any.
    pub fn last_released(&self) -> Option<u64> {
        self.last_released
    }

    /// Whether a frame with `sequence` can still be released in order.
    pub fn accepts(&self, sequence: u64) -> bool {
        self.last_released.map_or(true, |last| sequence > last)
    }

    /// Insert one frame, releasing the oldest half of the window when it
    /// reaches capacity.
    pub fn offer(&mut self, frame: VoiceFrame) -> Offered {
        if !self.accepts(frame.sequence) {
            return Offered::Stale(frame);
        }
        self.window.push(frame);
        if self.window.len() >= self.capacity {
            let half = (self.capacity / 2).max(1);
            Offered::Released(self.release(half))
        } else {
            Offered::Held
        }
    }

    /// Release every held frame in sequence order, leaving the window empty.
    pub fn flush(&mut self) -> Vec<VoiceFrame> {
        let all = self.window.len();
        self.release(all)
    }

    fn release(&mut self, count: usize) -> Vec<VoiceFrame> {
        self.window.sort_unstable_by_key(|f| f.sequence);
        let released: Vec<VoiceFrame> = self.window.drain(..count.min(self.window.len())).collect();
        if let Some(last) = released.last() {
            self.last_released = Some(last.sequence);
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceId;
    use std::time::Instant;

    fn frame(sequence: u64) -> VoiceFrame {
        VoiceFrame {
            source: SourceId::new(1),
            sequence,
            timestamp: sequence * 960,
            payload: vec![0xF8],
            received_at: Instant::now(),
        }
    }

    fn sequences(frames: &[VoiceFrame]) -> Vec<u64> {
        frames.iter().map(|f| f.sequence).collect()
    }

    #[test]
    fn holds_frames_below_capacity() {
        let mut buffer = ReorderBuffer::new(4);
        for seq in [9, 7, 8] {
            assert!(matches!(buffer.offer(frame(seq)), Offered::Held));
        }
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn releases_oldest_half_in_sequence_order() {
        let mut buffer = ReorderBuffer::new(4);
        buffer.offer(frame(5));
        buffer.offer(frame(8));
        buffer.offer(frame(6));

        match buffer.offer(frame(7)) {
            Offered::Released(released) => assert_eq!(sequences(&released), vec![5, 6]),
            other => panic!("expected release, got {other:?}"),
        }
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.last_released(), Some(6));
    }

    #[test]
    fn default_window_of_eight_releases_four() {
        let mut buffer = ReorderBuffer::new(8);
        let shuffled = [3, 0, 6, 2, 7, 1, 5, 4];
        let mut released = Vec::new();
        for seq in shuffled {
            if let Offered::Released(batch) = buffer.offer(frame(seq)) {
                released = batch;
            }
        }
        assert_eq!(sequences(&released), vec![0, 1, 2, 3]);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn flush_releases_everything_sorted() {
        let mut buffer = ReorderBuffer::new(8);
        for seq in [12, 10, 11] {
            buffer.offer(frame(seq));
        }
        assert_eq!(sequences(&buffer.flush()), vec![10, 11, 12]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.last_released(), Some(12));
    }

    #[test]
    fn straggler_behind_a_release_is_stale() {
        let mut buffer = ReorderBuffer::new(4);
        for seq in [4, 2, 3, 1] {
            buffer.offer(frame(seq));
        }
        // Sequences up to 2 have been released.
        assert!(matches!(buffer.offer(frame(2)), Offered::Stale(_)));
        assert!(matches!(buffer.offer(frame(1)), Offered::Stale(_)));
        assert!(matches!(buffer.offer(frame(5)), Offered::Held));
    }

    #[test]
    fn straggler_still_inside_the_window_is_accepted() {
        let mut buffer = ReorderBuffer::new(4);
        for seq in [1, 2, 5, 6] {
            buffer.offer(frame(seq));
        }
        // Released up to 2; 3 fits between the released batch and the rest.
        assert!(buffer.accepts(3));
        assert!(matches!(buffer.offer(frame(3)), Offered::Held));
        assert_eq!(sequences(&buffer.flush()), vec![3, 5, 6]);
    }

    #[test]
    fn flush_of_empty_window_is_empty() {
        let mut buffer = ReorderBuffer::new(4);
        assert!(buffer.flush().is_empty());
        assert_eq!(buffer.last_released(), None);
    }
}
