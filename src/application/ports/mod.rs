//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod observer;
pub mod transport;

// Re-export common types
pub use observer::{ObserverError, SessionEvent, SessionObserver};
pub use transport::FrameSource;
