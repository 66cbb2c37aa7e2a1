//! Live capture pipeline
//!
//! One router task fans the transport's frames out to per-source pipelines,
//! created lazily on first sight of a sourceId. Each pipeline is a decode
//! task and a record task joined by a bounded channel, so a source's
//! decode/record path shares no state with any sibling. Teardown is a
//! channel-close cascade: the router drops a pipeline's frame sender, the
//! decode task flushes its window and drops the decoded sender, and the
//! record task finalizes its file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::ports::FrameSource;
use crate::domain::{
    lead_in_frames, AggregateError, DecodedFrame, SessionConfig, SessionOrigin, SourceId,
    VoiceFrame,
};

use super::decode::{DecodeError, SourceDecoder};
use super::storage::{track_path, TrackFile, TrackWriter, WriteError};

/// One source-scoped failure surfaced during capture.
#[derive(Debug, Error)]
pub enum SourceFault {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl SourceFault {
    /// The source the fault belongs to.
    pub fn source_id(&self) -> SourceId {
        match self {
            Self::Decode(error) => error.source_id(),
            Self::Write(error) => error.source_id(),
        }
    }
}

/// Everything the capture phase produced.
#[derive(Debug, Default)]
pub struct CaptureOutcome {
    /// Finalized tracks, ordered by source id; one per source that produced
    /// decodable audio.
    pub tracks: Vec<TrackFile>,
    /// Source-scoped faults that did not abort capture.
    pub faults: Vec<SourceFault>,
    /// Finalize failures; an affected source has no entry in `tracks`.
    pub finalize_errors: AggregateError<WriteError>,
}

struct SourcePipeline {
    frames: mpsc::Sender<VoiceFrame>,
    decode: JoinHandle<Vec<DecodeError>>,
    record: JoinHandle<RecordOutcome>,
}

#[derive(Default)]
struct RecordOutcome {
    track: Option<TrackFile>,
    write_faults: Vec<WriteError>,
    finalize_error: Option<WriteError>,
}

/// Run one session's capture phase until the transport ends or `cancel`
/// fires, then drain every pipeline and finalize every open track.
pub async fn run_capture<S: FrameSource>(
    mut source: S,
    prefix: PathBuf,
    config: SessionConfig,
    cancel: CancellationToken,
) -> CaptureOutcome {
    let origin = Arc::new(SessionOrigin::new());
    let mut pipelines: HashMap<SourceId, SourcePipeline> = HashMap::new();

    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("capture cancelled; draining pipelines");
                break;
            }
            frame = source.next_frame() => match frame {
                Some(frame) => frame,
                None => {
                    info!("transport stream ended; draining pipelines");
                    break;
                }
            },
        };

        origin.anchor(frame.received_at);
        let source_id = frame.source;
        let first_arrival = frame.received_at;
        let pipeline = pipelines.entry(source_id).or_insert_with(|| {
            spawn_pipeline(source_id, &prefix, &config, Arc::clone(&origin), first_arrival)
        });
        if pipeline.frames.send(frame).await.is_err() {
            // Only possible if the decode task went away; its fault is
            // collected at join time.
            debug!(source = %source_id, "dropping frame for defunct pipeline");
        }
    }

    let mut outcome = CaptureOutcome::default();
    for (source_id, pipeline) in pipelines {
        let SourcePipeline {
            frames,
            decode,
            record,
        } = pipeline;
        drop(frames);

        match decode.await {
            Ok(faults) => outcome
                .faults
                .extend(faults.into_iter().map(SourceFault::Decode)),
            Err(join_err) => warn!(source = %source_id, error = %join_err, "decode task aborted"),
        }
        match record.await {
            Ok(recorded) => {
                if let Some(track) = recorded.track {
                    outcome.tracks.push(track);
                }
                outcome
                    .faults
                    .extend(recorded.write_faults.into_iter().map(SourceFault::Write));
                if let Some(fault) = recorded.finalize_error {
                    outcome.finalize_errors.push(fault);
                }
            }
            Err(join_err) => warn!(source = %source_id, error = %join_err, "record task aborted"),
        }
    }

    outcome.tracks.sort_by_key(|track| track.source);
    info!(
        tracks = outcome.tracks.len(),
        faults = outcome.faults.len(),
        "capture finished"
    );
    outcome
}

fn spawn_pipeline(
    source: SourceId,
    prefix: &Path,
    config: &SessionConfig,
    origin: Arc<SessionOrigin>,
    first_arrival: Instant,
) -> SourcePipeline {
    let (frame_tx, frame_rx) = mpsc::channel(config.frame_queue_depth);
    let (decoded_tx, decoded_rx) = mpsc::channel(config.decoded_queue_depth);
    let path = track_path(prefix, source);
    info!(source = %source, "starting source pipeline");

    SourcePipeline {
        frames: frame_tx,
        decode: tokio::spawn(decode_task(
            source,
            config.reorder_capacity,
            frame_rx,
            decoded_tx,
        )),
        record: tokio::spawn(record_task(source, path, origin, first_arrival, decoded_rx)),
    }
}

async fn decode_task(
    source: SourceId,
    window_capacity: usize,
    mut frames: mpsc::Receiver<VoiceFrame>,
    decoded: mpsc::Sender<DecodedFrame>,
) -> Vec<DecodeError> {
    let mut decoder = match SourceDecoder::new(source, window_capacity) {
        Ok(decoder) => decoder,
        Err(fault) => {
            // Keep consuming so the router never blocks on a dead source.
            warn!(source = %source, "decoder unavailable; discarding frames");
            while frames.recv().await.is_some() {}
            return vec![fault];
        }
    };

    let mut faults = Vec::new();
    while let Some(frame) = frames.recv().await {
        let output = decoder.submit(frame);
        faults.extend(output.faults);
        for frame in output.frames {
            if decoded.send(frame).await.is_err() {
                while frames.recv().await.is_some() {}
                return faults;
            }
        }
    }

    let output = decoder.flush();
    faults.extend(output.faults);
    for frame in output.frames {
        if decoded.send(frame).await.is_err() {
            break;
        }
    }
    faults
}

async fn record_task(
    source: SourceId,
    path: PathBuf,
    origin: Arc<SessionOrigin>,
    first_arrival: Instant,
    mut decoded: mpsc::Receiver<DecodedFrame>,
) -> RecordOutcome {
    let mut outcome = RecordOutcome::default();
    let mut writer: Option<TrackWriter> = None;
    let mut failed = false;

    while let Some(frame) = decoded.recv().await {
        if failed {
            continue;
        }
        if writer.is_none() {
            let lead_in = origin
                .get()
                .map_or(0, |anchor| lead_in_frames(anchor, first_arrival));
            match TrackWriter::create(path.clone(), source, lead_in, frame.timestamp) {
                Ok(track) => writer = Some(track),
                Err(fault) => {
                    warn!(source = %source, "could not open track; discarding stream");
                    outcome.write_faults.push(fault);
                    failed = true;
                    continue;
                }
            }
        }
        if let Some(track) = writer.as_mut() {
            if let Err(fault) = track.append(&frame) {
                warn!(source = %source, "stopping track writes after failure");
                outcome.write_faults.push(fault);
                failed = true;
            }
        }
    }

    if let Some(track) = writer {
        match track.finalize() {
            Ok(file) => {
                info!(
                    source = %source,
                    path = %file.path.display(),
                    sample_frames = file.sample_frames,
                    "track finalized"
                );
                outcome.track = Some(file);
            }
            Err(fault) => outcome.finalize_error = Some(fault),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SAMPLE_RATE;
    use crate::infrastructure::transport::ChannelFrameSource;
    use opus::{Application, Channels, Encoder};
    use tempfile::tempdir;

    fn encoded_frame(encoder: &mut Encoder, source: u32, sequence: u64, at: Instant) -> VoiceFrame {
        let pcm = vec![0i16; 960 * 2];
        VoiceFrame {
            source: SourceId::new(source),
            sequence,
            timestamp: sequence * 960,
            payload: encoder.encode_vec(&pcm, 4000).unwrap(),
            received_at: at,
        }
    }

    #[tokio::test]
    async fn end_of_stream_flushes_window_and_finalizes_track() {
        let dir = tempdir().unwrap();
        let prefix = dir.path().join("call");
        let mut enc = Encoder::new(SAMPLE_RATE, Channels::Stereo, Application::Audio).unwrap();
        let (sender, source) = ChannelFrameSource::pair(16);

        let now = Instant::now();
        for seq in 0..3 {
            sender
                .send(encoded_frame(&mut enc, 7, seq, now))
                .await
                .unwrap();
        }
        drop(sender);

        let outcome = run_capture(
            source,
            prefix.clone(),
            SessionConfig::default(),
            CancellationToken::new(),
        )
        .await;

        assert!(outcome.faults.is_empty());
        assert!(outcome.finalize_errors.is_empty());
        assert_eq!(outcome.tracks.len(), 1);
        let track = &outcome.tracks[0];
        assert_eq!(track.source, SourceId::new(7));
        assert_eq!(track.sample_frames, 3 * 960);

        let reader = hound::WavReader::open(&track.path).unwrap();
        assert_eq!(u64::from(reader.duration()), 3 * 960);
    }

    #[tokio::test]
    async fn cancelled_session_accepts_no_frames() {
        let dir = tempdir().unwrap();
        let prefix = dir.path().join("call");
        let (sender, source) = ChannelFrameSource::pair(16);
        let cancel = CancellationToken::new();
        cancel.cancel();
        // A second trigger is a no-op.
        cancel.cancel();

        let outcome = run_capture(source, prefix, SessionConfig::default(), cancel).await;
        drop(sender);

        assert!(outcome.tracks.is_empty());
        assert!(outcome.faults.is_empty());
    }

    #[tokio::test]
    async fn silent_source_produces_no_file() {
        let dir = tempdir().unwrap();
        let prefix = dir.path().join("call");
        let (sender, source) = ChannelFrameSource::pair(16);
        drop(sender);

        let outcome = run_capture(
            source,
            prefix.clone(),
            SessionConfig::default(),
            CancellationToken::new(),
        )
        .await;

        assert!(outcome.tracks.is_empty());
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
