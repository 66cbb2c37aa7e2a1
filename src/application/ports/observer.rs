//! Session observer port interface
//!
//! Stage-boundary notifications for the session coordinator, which typically
//! relays them to its chat surface. The core never blocks on an observer
//! beyond awaiting its future.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::SourceId;

/// Observer delivery errors
#[derive(Debug, Clone, Error)]
pub enum ObserverError {
    #[error("Failed to deliver session event: {0}")]
    DeliveryFailed(String),
}

/// Progress events emitted at session stage boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Capture pipeline is live and accepting frames.
    RecordingStarted,
    /// Capture stopped; per-speaker tracks are finalized.
    RecordingFinished,
    /// Combining per-speaker tracks into the mixdown file.
    MixdownStarted,
    /// All output files are complete.
    SessionComplete,
    /// One source failed mid-capture; siblings are unaffected.
    SourceFault { source: SourceId, message: String },
}

/// Port for session progress notifications
#[async_trait]
pub trait SessionObserver: Send + Sync {
    /// Deliver one session event.
    ///
    /// A delivery failure is reported back so the caller can log it; it is
    /// never allowed to fail the session itself.
    async fn notify(&self, event: SessionEvent) -> Result<(), ObserverError>;
}

/// Blanket implementation for boxed observer types
#[async_trait]
impl SessionObserver for Box<dyn SessionObserver> {
    async fn notify(&self, event: SessionEvent) -> Result<(), ObserverError> {
        self.as_ref().notify(event).await
    }
}
