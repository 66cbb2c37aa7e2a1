//! Channel-backed transport adapter
//!
//! Bridges transports that already deliver frames over a channel (the usual
//! shape of a voice-gateway client) onto the `FrameSource` port.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ports::FrameSource;
use crate::domain::VoiceFrame;

/// `FrameSource` over a bounded tokio channel.
///
/// The transport side keeps the `Sender`; dropping it ends the session's
/// inbound stream.
pub struct ChannelFrameSource {
    receiver: mpsc::Receiver<VoiceFrame>,
}

impl ChannelFrameSource {
    pub fn new(receiver: mpsc::Receiver<VoiceFrame>) -> Self {
        Self { receiver }
    }

    /// A connected sender/source pair with the given channel depth.
    pub fn pair(depth: usize) -> (mpsc::Sender<VoiceFrame>, Self) {
        let (sender, receiver) = mpsc::channel(depth);
        (sender, Self::new(receiver))
    }
}

#[async_trait]
impl FrameSource for ChannelFrameSource {
    async fn next_frame(&mut self) -> Option<VoiceFrame> {
        self.receiver.recv().await
    }
}
