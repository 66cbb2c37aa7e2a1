//! Infrastructure layer - Adapter implementations
//!
//! Contains the concrete machinery behind the ports: Opus decoding,
//! WAV track storage, the live capture pipeline, and the mixdown engine.

pub mod capture;
pub mod decode;
pub mod mixdown;
pub mod observer;
pub mod storage;
pub mod transport;

// Re-export adapters
pub use capture::{run_capture, CaptureOutcome, SourceFault};
pub use decode::{DecodeError, SourceDecoder};
pub use mixdown::{run_mixdown, MixError, MixFile};
pub use observer::{NullObserver, TracingObserver};
pub use storage::{
    mix_path, output_dir, remove_session_files, track_path, DiscardError, TrackFile, TrackWriter,
    WriteError,
};
pub use transport::ChannelFrameSource;
