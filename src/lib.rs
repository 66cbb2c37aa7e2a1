//! TrackSplit - multi-speaker voice recording engine
//!
//! This crate records a live multi-speaker call into one time-aligned WAV
//! track per speaker, then mixes the finished tracks into a single stereo
//! file. Encoded Opus frames enter through a transport port; everything
//! downstream (reordering, decoding, timeline alignment, mixdown) happens
//! here.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Timeline math, mixing math, session state, and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Opus decoding, WAV storage, capture and mixdown
//!   pipelines
//!
//! # Example
//!
//! ```no_run
//! use tracksplit::application::RecordSessionUseCase;
//! use tracksplit::domain::SessionConfig;
//! use tracksplit::infrastructure::{ChannelFrameSource, NullObserver};
//!
//! # async fn run() -> Result<(), tracksplit::application::SessionError> {
//! let mut session = RecordSessionUseCase::new(SessionConfig::default(), NullObserver);
//! let (frames, source) = ChannelFrameSource::pair(32);
//! session.start_recording(source, "/tmp/call").await?;
//! // feed `frames` from the network...
//! # drop(frames);
//! let summary = session.stop_recording().await?;
//! println!("recorded {} tracks", summary.tracks.len());
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
