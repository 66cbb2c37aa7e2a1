//! Record session use case

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{
    AggregateError, ConfigError, InvalidStateTransition, SessionConfig, SessionLifecycle,
    SessionState,
};
use crate::infrastructure::capture::{run_capture, CaptureOutcome, SourceFault};
use crate::infrastructure::mixdown::{run_mixdown, MixError, MixFile};
use crate::infrastructure::storage::{
    mix_path, output_dir, remove_session_files, DiscardError, TrackFile, WriteError,
};

use super::ports::{FrameSource, SessionEvent, SessionObserver};

/// Errors from the record session use case
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session state: {0}")]
    State(#[from] InvalidStateTransition),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to prepare output directory {path}: {cause}")]
    PrepareOutput {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("Recording task failed: {0}")]
    Capture(#[source] tokio::task::JoinError),

    #[error("Track finalization failed: {0}")]
    Finalize(#[from] AggregateError<WriteError>),

    #[error("Mixdown failed: {0}")]
    Mixdown(#[from] AggregateError<MixError>),

    #[error("Failed to discard recording: {0}")]
    Discard(#[from] AggregateError<DiscardError>),
}

/// Output from a completed session
#[derive(Debug)]
pub struct SessionSummary {
    /// Finalized per-source tracks, ordered by source id
    pub tracks: Vec<TrackFile>,
    /// The combined mix; `None` when no source produced audio
    pub mix: Option<MixFile>,
    /// Source-scoped faults the session survived
    pub faults: Vec<SourceFault>,
}

struct ActiveSession {
    prefix: PathBuf,
    cancel: CancellationToken,
    capture: JoinHandle<CaptureOutcome>,
}

/// Single-session recording coordinator
///
/// Owns the idle/recording state machine. `start_recording` spawns the
/// capture pipeline for one frame source; `stop_recording` drains it,
/// mixes the finalized tracks, and returns the session summary.
pub struct RecordSessionUseCase<O>
where
    O: SessionObserver,
{
    config: SessionConfig,
    observer: O,
    lifecycle: SessionLifecycle,
    active: Option<ActiveSession>,
}

impl<O> RecordSessionUseCase<O>
where
    O: SessionObserver,
{
    /// Create a new use case instance
    pub fn new(config: SessionConfig, observer: O) -> Self {
        Self {
            config,
            observer,
            lifecycle: SessionLifecycle::new(),
            active: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// Whether a session is currently recording
    pub fn is_recording(&self) -> bool {
        self.lifecycle.is_recording()
    }

    /// Start recording frames from `source` into `{prefix}-*.wav` files,
    /// creating the output directory first. A prefix ending in a path
    /// separator names that directory itself; outputs then land inside it.
    pub async fn start_recording<S>(
        &mut self,
        source: S,
        prefix: impl Into<PathBuf>,
    ) -> Result<(), SessionError>
    where
        S: FrameSource + 'static,
    {
        self.config.validate()?;
        let prefix = prefix.into();
        let dir = output_dir(&prefix);
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|cause| SessionError::PrepareOutput {
                path: dir.to_path_buf(),
                cause,
            })?;
        self.lifecycle.start_recording()?;

        let cancel = CancellationToken::new();
        let capture = tokio::spawn(run_capture(
            source,
            prefix.clone(),
            self.config.clone(),
            cancel.clone(),
        ));
        info!(prefix = %prefix.display(), "recording started");
        self.active = Some(ActiveSession {
            prefix,
            cancel,
            capture,
        });

        self.emit(SessionEvent::RecordingStarted).await;
        Ok(())
    }

    /// Stop the running session: drain capture, finalize every track, and
    /// mix them into one stereo file.
    pub async fn stop_recording(&mut self) -> Result<SessionSummary, SessionError> {
        let Some(active) = self.active.take() else {
            return Err(InvalidStateTransition {
                current_state: self.lifecycle.state(),
                action: "stop recording",
            }
            .into());
        };
        self.lifecycle.stop_recording()?;

        active.cancel.cancel();
        let outcome = active.capture.await.map_err(SessionError::Capture)?;

        self.emit(SessionEvent::RecordingFinished).await;
        for fault in &outcome.faults {
            self.emit(SessionEvent::SourceFault {
                source: fault.source_id(),
                message: fault.to_string(),
            })
            .await;
        }
        outcome.finalize_errors.into_result()?;

        let mix = if outcome.tracks.is_empty() {
            None
        } else {
            self.emit(SessionEvent::MixdownStarted).await;
            run_mixdown(
                &outcome.tracks,
                &mix_path(&active.prefix),
                self.config.mixdown_queue_depth,
                self.config.attenuation(),
            )
            .await?
        };

        self.emit(SessionEvent::SessionComplete).await;
        info!(
            tracks = outcome.tracks.len(),
            faults = outcome.faults.len(),
            "recording session complete"
        );
        Ok(SessionSummary {
            tracks: outcome.tracks,
            mix,
            faults: outcome.faults,
        })
    }

    /// Delete every output file recorded under `prefix`: the per-source
    /// tracks and the mixdown.
    ///
    /// Matches `{prefix}-*.wav`, so tracks from sources that faulted after
    /// their file was created are swept too; a prefix that names a directory
    /// (trailing separator) is swept inside that directory. Returns the
    /// removed paths; a prefix with no recordings removes nothing. The
    /// caller must not discard the prefix of a session that is still
    /// recording.
    pub async fn discard_recording(
        &self,
        prefix: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>, SessionError> {
        let removed = remove_session_files(prefix.as_ref()).await?;
        info!(removed = removed.len(), "recording discarded");
        Ok(removed)
    }

    /// Event delivery is best effort; a failing observer never fails the
    /// session.
    async fn emit(&self, event: SessionEvent) {
        if let Err(error) = self.observer.notify(event).await {
            warn!(%error, "session observer rejected event");
        }
    }
}
