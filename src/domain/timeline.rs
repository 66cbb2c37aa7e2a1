//! Shared-timeline reconstruction math
//!
//! Media-clock timestamps are only comparable within one source's own stream.
//! The offset between sources is reconstructed from local arrival times
//! against a single session-wide anchor: the arrival of the session's very
//! first frame. Everything here is pure bookkeeping over instants and tick
//! counts.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use super::frame::TICKS_PER_SECOND;

/// The session's single wall-clock anchor.
///
/// Written once, first-writer-wins, read-only thereafter. Shared across all
/// per-source pipelines of one session.
#[derive(Debug, Default)]
pub struct SessionOrigin {
    instant: OnceLock<Instant>,
}

impl SessionOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `arrival` as the session's first-frame instant unless an
    /// earlier writer already anchored it. Returns the anchored instant
    /// either way.
    pub fn anchor(&self, arrival: Instant) -> Instant {
        *self.instant.get_or_init(|| arrival)
    }

    pub fn get(&self) -> Option<Instant> {
        self.instant.get().copied()
    }
}

/// Whole stereo sample frames covering `duration` at the fixed rate, rounded
/// to the nearest frame.
pub fn duration_to_frames(duration: Duration) -> u64 {
    (duration.as_secs_f64() * f64::from(TICKS_PER_SECOND)).round() as u64
}

/// Zero-sample lead-in for a source whose first frame arrived some time
/// after the session origin. Saturates to zero if the arrival raced the
/// anchor and landed earlier.
pub fn lead_in_frames(origin: Instant, first_arrival: Instant) -> u64 {
    duration_to_frames(first_arrival.saturating_duration_since(origin))
}
