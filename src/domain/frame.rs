//! Voice frame value objects
//!
//! The frame types that flow through a recording session: compressed frames
//! from the transport and decoded PCM frames headed for a track file. Frames
//! are message values; they are moved between tasks and never shared.

use std::fmt;
use std::time::Instant;

/// Samples per second of the fixed output format.
pub const SAMPLE_RATE: u32 = 48_000;

/// Interleaved channels in the fixed output format.
pub const CHANNEL_COUNT: u16 = 2;

/// Bit depth of the fixed output format.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Media-clock ticks per second. One tick is one stereo sample frame, so the
/// media clock advances at exactly the sample rate.
pub const TICKS_PER_SECOND: u32 = SAMPLE_RATE;

/// Opaque per-speaker stream identifier.
///
/// Assigned by the transport and stable for the session's lifetime. The
/// numeric value is only ever used for display and file naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u32);

impl SourceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for SourceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One compressed frame as delivered by the transport.
///
/// `sequence` and `timestamp` are per-source counters; the transport adapter
/// is responsible for unwrapping any narrower wire counters into `u64` before
/// frames enter the pipeline. `received_at` is the local monotonic arrival
/// time and is the only clock comparable across sources.
#[derive(Debug, Clone)]
pub struct VoiceFrame {
    pub source: SourceId,
    pub sequence: u64,
    /// Media-clock position of this frame's first sample, in ticks.
    pub timestamp: u64,
    /// Compressed Opus payload.
    pub payload: Vec<u8>,
    pub received_at: Instant,
}

/// One decoded frame: interleaved left/right 16-bit PCM plus the timeline
/// fields carried through from the compressed frame.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub source: SourceId,
    /// Media-clock position of the first sample frame, in ticks.
    pub timestamp: u64,
    pub received_at: Instant,
    /// Interleaved stereo samples; length is always a multiple of two.
    pub pcm: Vec<i16>,
}

impl DecodedFrame {
    /// Number of stereo sample frames in this payload.
    pub fn sample_frames(&self) -> u64 {
        (self.pcm.len() / CHANNEL_COUNT as usize) as u64
    }

    /// Media-clock tick one past this frame's last sample frame.
    pub fn end_timestamp(&self) -> u64 {
        self.timestamp + self.sample_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_display_is_raw_value() {
        assert_eq!(SourceId::new(814).to_string(), "814");
    }

    #[test]
    fn source_id_from_u32() {
        assert_eq!(SourceId::from(7), SourceId::new(7));
    }

    #[test]
    fn sample_frames_counts_stereo_pairs() {
        let frame = DecodedFrame {
            source: SourceId::new(1),
            timestamp: 0,
            received_at: Instant::now(),
            pcm: vec![0; 1920],
        };
        assert_eq!(frame.sample_frames(), 960);
    }

    #[test]
    fn end_timestamp_advances_by_sample_frames() {
        let frame = DecodedFrame {
            source: SourceId::new(1),
            timestamp: 4800,
            received_at: Instant::now(),
            pcm: vec![0; 1920],
        };
        assert_eq!(frame.end_timestamp(), 4800 + 960);
    }

    #[test]
    fn tick_rate_matches_sample_rate() {
        assert_eq!(TICKS_PER_SECOND, SAMPLE_RATE);
    }
}
