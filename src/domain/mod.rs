//! Domain layer - Core audio and session logic
//!
//! Contains the frame value objects, timeline and mixing math, the session
//! state machine, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod frame;
pub mod mix;
pub mod session;
pub mod timeline;

// Re-export common types
pub use config::SessionConfig;
pub use error::{AggregateError, ConfigError};
pub use frame::{
    DecodedFrame, SourceId, VoiceFrame, BITS_PER_SAMPLE, CHANNEL_COUNT, SAMPLE_RATE,
    TICKS_PER_SECOND,
};
pub use mix::{mix_round, peak_limited_add, Attenuation, StereoSample, DEFAULT_ATTENUATION_DB};
pub use session::{InvalidStateTransition, SessionLifecycle, SessionState};
pub use timeline::{duration_to_frames, lead_in_frames, SessionOrigin};
