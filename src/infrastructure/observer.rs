//! Session observer adapters

use async_trait::async_trait;
use tracing::info;

use crate::application::ports::{ObserverError, SessionEvent, SessionObserver};

/// Observer that discards every event.
///
/// Used when the host application has no progress surface to drive.
pub struct NullObserver;

impl NullObserver {
    /// Create a new null observer.
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionObserver for NullObserver {
    async fn notify(&self, _event: SessionEvent) -> Result<(), ObserverError> {
        // Do nothing
        Ok(())
    }
}

/// Observer that forwards every event to the log.
pub struct TracingObserver;

impl TracingObserver {
    /// Create a new tracing observer.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionObserver for TracingObserver {
    async fn notify(&self, event: SessionEvent) -> Result<(), ObserverError> {
        match event {
            SessionEvent::SourceFault { source, message } => {
                info!(%source, %message, "session event: source fault");
            }
            event => info!(?event, "session event"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_observer_accepts_all_events() {
        let observer = NullObserver::new();
        assert!(observer.notify(SessionEvent::RecordingStarted).await.is_ok());
        assert!(observer.notify(SessionEvent::SessionComplete).await.is_ok());
    }
}
