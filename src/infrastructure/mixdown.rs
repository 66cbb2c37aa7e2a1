//! Stereo mixdown
//!
//! Combines the finalized per-source tracks into one stereo file. Each input
//! gets a producer task streaming its samples through a bounded queue; the
//! combiner pulls one sample frame from every live queue per round, mixes
//! them, and appends the result. A queue that runs dry marks its track
//! finished, and that slot contributes silence for the remaining rounds so
//! the round width never changes. File I/O runs on the blocking pool.

use std::path::{Path, PathBuf};

use hound::{WavReader, WavWriter};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{mix_round, AggregateError, Attenuation, StereoSample};

use super::storage::{wav_spec, TrackFile};

/// A mixdown failure tied to one input or the output file.
#[derive(Debug, Error)]
pub enum MixError {
    #[error("Failed to open mix input {path}: {cause}")]
    OpenInput {
        path: PathBuf,
        #[source]
        cause: hound::Error,
    },
    #[error("Mix input {path} is not 16-bit 48kHz stereo")]
    InputFormat { path: PathBuf },
    #[error("Failed to read mix input {path}: {cause}")]
    ReadInput {
        path: PathBuf,
        #[source]
        cause: hound::Error,
    },
    #[error("Failed to create mix output {path}: {cause}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        cause: hound::Error,
    },
    #[error("Failed to write mix output: {0}")]
    WriteOutput(#[source] hound::Error),
    #[error("Failed to finalize mix output: {0}")]
    FinalizeOutput(#[source] hound::Error),
    #[error("Mix combiner task failed: {0}")]
    Combiner(#[source] tokio::task::JoinError),
}

/// The finished mixdown file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixFile {
    pub path: PathBuf,
    /// Stereo sample frames written; the length of the longest input.
    pub sample_frames: u64,
}

/// One queue item: a sample frame, or the producer's failure delivered
/// in-band so the combiner can abort the round it would have joined.
type Produced = Result<StereoSample, MixError>;

/// Mix `tracks` into a single stereo file at `output`.
///
/// Returns `Ok(None)` without touching the filesystem when `tracks` is
/// empty. Any failure cancels the remaining work, removes the partial
/// output, and reports every error that surfaced while unwinding.
pub async fn run_mixdown(
    tracks: &[TrackFile],
    output: &Path,
    queue_depth: usize,
    attenuation: Attenuation,
) -> Result<Option<MixFile>, AggregateError<MixError>> {
    if tracks.is_empty() {
        debug!("no tracks to mix; skipping mixdown");
        return Ok(None);
    }

    info!(tracks = tracks.len(), path = %output.display(), "mixing session tracks");
    let mut producers = Vec::with_capacity(tracks.len());
    let mut queues = Vec::with_capacity(tracks.len());
    for track in tracks {
        let (sender, receiver) = mpsc::channel(queue_depth);
        producers.push(spawn_producer(track.path.clone(), sender));
        queues.push(Some(receiver));
    }

    let output_path = output.to_path_buf();
    let combiner =
        tokio::task::spawn_blocking(move || combine(queues, &output_path, attenuation));
    let combined = match combiner.await {
        Ok(combined) => combined,
        Err(join_err) => {
            remove_partial(output);
            Err(MixError::Combiner(join_err))
        }
    };

    match combined {
        Ok(file) => {
            // With errors delivered in-band, a completed mix implies every
            // producer ran dry; joining them is just cleanup.
            let mut errors = AggregateError::new();
            collect_producer_errors(producers, &mut errors).await;
            match errors.into_result() {
                Ok(()) => {
                    info!(sample_frames = file.sample_frames, "mixdown complete");
                    Ok(Some(file))
                }
                Err(errors) => {
                    remove_partial(&file.path);
                    Err(errors)
                }
            }
        }
        Err(error) => {
            // Dropping the queues already cancelled the remaining producers;
            // pick up any failures they hit while unwinding.
            let mut errors = AggregateError::from(vec![error]);
            collect_producer_errors(producers, &mut errors).await;
            Err(errors)
        }
    }
}

fn spawn_producer(path: PathBuf, sender: mpsc::Sender<Produced>) -> JoinHandle<Result<(), MixError>> {
    tokio::task::spawn_blocking(move || {
        let result = stream_track(&path, &sender);
        match result {
            Ok(()) => Ok(()),
            Err(error) => match sender.blocking_send(Err(error)) {
                // The combiner owns reporting it now.
                Ok(()) => Ok(()),
                // Combiner already gone; report through the join handle.
                Err(mpsc::error::SendError(item)) => item.map(|_| ()),
            },
        }
    })
}

fn stream_track(path: &Path, sender: &mpsc::Sender<Produced>) -> Result<(), MixError> {
    let mut reader = WavReader::open(path).map_err(|cause| MixError::OpenInput {
        path: path.to_path_buf(),
        cause,
    })?;
    if reader.spec() != wav_spec() {
        return Err(MixError::InputFormat {
            path: path.to_path_buf(),
        });
    }

    let mut samples = reader.samples::<i16>();
    loop {
        let left = match samples.next() {
            Some(sample) => sample.map_err(|cause| MixError::ReadInput {
                path: path.to_path_buf(),
                cause,
            })?,
            None => return Ok(()),
        };
        let right = match samples.next() {
            Some(sample) => sample.map_err(|cause| MixError::ReadInput {
                path: path.to_path_buf(),
                cause,
            })?,
            // Trailing half frame; pad the right channel.
            None => 0,
        };
        if sender
            .blocking_send(Ok(StereoSample::new(left, right)))
            .is_err()
        {
            // Combiner aborted; stop reading.
            return Ok(());
        }
    }
}

fn combine(
    mut queues: Vec<Option<mpsc::Receiver<Produced>>>,
    output: &Path,
    attenuation: Attenuation,
) -> Result<MixFile, MixError> {
    let mut writer = WavWriter::create(output, wav_spec()).map_err(|cause| MixError::CreateOutput {
        path: output.to_path_buf(),
        cause,
    })?;

    let mut round = Vec::with_capacity(queues.len());
    let mut sample_frames = 0u64;
    let abort = loop {
        round.clear();
        let mut live = false;
        let mut failure = None;
        for slot in queues.iter_mut() {
            let sample = match slot {
                Some(receiver) => match receiver.blocking_recv() {
                    Some(Ok(sample)) => {
                        live = true;
                        sample
                    }
                    Some(Err(error)) => {
                        failure = Some(error);
                        break;
                    }
                    None => {
                        *slot = None;
                        StereoSample::SILENCE
                    }
                },
                None => StereoSample::SILENCE,
            };
            round.push(sample);
        }
        if let Some(error) = failure {
            break Some(error);
        }
        if !live {
            break None;
        }

        let mixed = mix_round(&round, attenuation);
        let write = writer
            .write_sample(mixed.left)
            .and_then(|()| writer.write_sample(mixed.right));
        if let Err(cause) = write {
            break Some(MixError::WriteOutput(cause));
        }
        sample_frames += 1;
    };

    if let Some(error) = abort {
        drop(queues);
        drop(writer);
        remove_partial(output);
        return Err(error);
    }

    match writer.finalize() {
        Ok(()) => Ok(MixFile {
            path: output.to_path_buf(),
            sample_frames,
        }),
        Err(cause) => {
            remove_partial(output);
            Err(MixError::FinalizeOutput(cause))
        }
    }
}

async fn collect_producer_errors(
    producers: Vec<JoinHandle<Result<(), MixError>>>,
    errors: &mut AggregateError<MixError>,
) {
    for producer in producers {
        match producer.await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => errors.push(error),
            Err(join_err) => warn!(error = %join_err, "mix producer aborted"),
        }
    }
}

fn remove_partial(path: &Path) {
    if let Err(error) = std::fs::remove_file(path) {
        debug!(path = %path.display(), %error, "could not remove partial mix output");
    }
}
