//! Per-source track writing
//!
//! One WAV sink per source, created lazily on the source's first decoded
//! frame. The writer keeps the track time-aligned on the shared session
//! timeline: a wall-clock lead-in offsets late joiners, and media-clock gaps
//! between frames become zero samples. Timestamps never move the write
//! cursor backwards.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use hound::WavWriter;
use thiserror::Error;
use tracing::debug;

use crate::domain::{DecodedFrame, SourceId};

use super::wav_spec;

/// Write errors, scoped to one source's track
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create track file {path}: {cause}")]
    Create {
        source: SourceId,
        path: PathBuf,
        #[source]
        cause: hound::Error,
    },

    #[error("Failed to write samples for source {source}: {cause}")]
    Append {
        source: SourceId,
        #[source]
        cause: hound::Error,
    },

    #[error("Failed to finalize track for source {source}: {cause}")]
    Finalize {
        source: SourceId,
        #[source]
        cause: hound::Error,
    },
}

impl WriteError {
    /// The source whose track hit the failure.
    pub fn source_id(&self) -> SourceId {
        match self {
            Self::Create { source, .. }
            | Self::Append { source, .. }
            | Self::Finalize { source, .. } => *source,
        }
    }
}

/// A finalized per-source track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFile {
    pub source: SourceId,
    pub path: PathBuf,
    /// Stereo sample frames in the file, zero fill included.
    pub sample_frames: u64,
}

/// Open WAV sink plus timeline bookkeeping for one source.
pub struct TrackWriter {
    source: SourceId,
    path: PathBuf,
    writer: WavWriter<BufWriter<File>>,
    /// Media-clock tick one past the last written sample frame.
    position: u64,
    /// Sample frames written so far, lead-in included.
    written: u64,
}

impl TrackWriter {
    /// Open the sink and write the shared-timeline lead-in.
    ///
    /// `start_timestamp` is the media-clock position of the source's first
    /// frame; the source's own clock starts there, so the write cursor does
    /// too. `lead_in` sample frames of silence go in front, placing the
    /// track at its wall-clock offset from the session origin.
    pub fn create(
        path: PathBuf,
        source: SourceId,
        lead_in: u64,
        start_timestamp: u64,
    ) -> Result<Self, WriteError> {
        let writer = WavWriter::create(&path, wav_spec()).map_err(|cause| WriteError::Create {
            source,
            path: path.clone(),
            cause,
        })?;
        debug!(source = %source, path = %path.display(), lead_in, "creating track");

        let mut track = Self {
            source,
            path,
            writer,
            position: start_timestamp,
            written: 0,
        };
        track.write_silence(lead_in)?;
        Ok(track)
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Sample frames written so far.
    pub fn sample_frames(&self) -> u64 {
        self.written
    }

    /// Write one decoded frame, filling any media-clock gap since the last
    /// write with silence first.
    pub fn append(&mut self, frame: &DecodedFrame) -> Result<(), WriteError> {
        if frame.timestamp < self.position {
            debug!(
                source = %self.source,
                timestamp = frame.timestamp,
                position = self.position,
                "skipping frame that would rewind the track"
            );
            return Ok(());
        }

        let gap = frame.timestamp - self.position;
        self.write_silence(gap)?;
        for &sample in &frame.pcm {
            self.writer
                .write_sample(sample)
                .map_err(|cause| WriteError::Append {
                    source: self.source,
                    cause,
                })?;
        }
        self.position = frame.end_timestamp();
        self.written += frame.sample_frames();
        Ok(())
    }

    /// Patch the container's size fields and hand back the track metadata.
    pub fn finalize(self) -> Result<TrackFile, WriteError> {
        let Self {
            source,
            path,
            writer,
            written,
            ..
        } = self;
        writer
            .finalize()
            .map_err(|cause| WriteError::Finalize { source, cause })?;
        Ok(TrackFile {
            source,
            path,
            sample_frames: written,
        })
    }

    fn write_silence(&mut self, sample_frames: u64) -> Result<(), WriteError> {
        for _ in 0..sample_frames {
            for _ in 0..2 {
                self.writer
                    .write_sample(0i16)
                    .map_err(|cause| WriteError::Append {
                        source: self.source,
                        cause,
                    })?;
            }
        }
        self.written += sample_frames;
        Ok(())
    }
}
