//! Transport port interface
//!
//! The live stream of compressed voice frames feeding a recording session.
//! A silent source simply sends no frames; frames may arrive locally
//! reordered within the transport's own delivery window.

use async_trait::async_trait;

use crate::domain::VoiceFrame;

/// Port for the inbound frame stream of one session.
///
/// The pipeline owns the source exclusively and pulls frames until the
/// stream ends. A transport that fails terminally ends its stream; there is
/// no per-frame error channel, mirroring how lossy voice transports behave.
#[async_trait]
pub trait FrameSource: Send {
    /// Receive the next frame, or `None` once the stream has ended.
    async fn next_frame(&mut self) -> Option<VoiceFrame>;
}

/// Blanket implementation for boxed sources
#[async_trait]
impl FrameSource for Box<dyn FrameSource> {
    async fn next_frame(&mut self) -> Option<VoiceFrame> {
        self.as_mut().next_frame().await
    }
}
