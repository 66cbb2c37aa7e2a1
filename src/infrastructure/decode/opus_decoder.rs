//! Per-source Opus decode stage
//!
//! One stateful decoder per source: Opus exploits inter-frame prediction, so
//! decoder instances are never shared across sources and are reset, not
//! rebuilt, when a stream flushes. The stage pairs the codec with its
//! source's reorder window and emits PCM in strict sequence order.

use opus::{Channels, Decoder};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{DecodedFrame, SourceId, VoiceFrame, CHANNEL_COUNT, SAMPLE_RATE};

use super::reorder::{Offered, ReorderBuffer};

/// Longest Opus frame at 48 kHz: 120 ms of samples per channel.
const MAX_FRAME_SAMPLES: usize = 5760;

/// Decode errors, scoped to one source
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to create decoder for source {source}: {cause}")]
    CreateDecoder {
        source: SourceId,
        #[source]
        cause: opus::Error,
    },

    #[error("Failed to decode frame {sequence} from source {source}: {cause}")]
    DecodeFrame {
        source: SourceId,
        sequence: u64,
        #[source]
        cause: opus::Error,
    },

    #[error("Failed to reset decoder state for source {source}: {cause}")]
    ResetState {
        source: SourceId,
        #[source]
        cause: opus::Error,
    },
}

impl DecodeError {
    /// The source whose stream hit the failure.
    pub fn source_id(&self) -> SourceId {
        match self {
            Self::CreateDecoder { source, .. }
            | Self::DecodeFrame { source, .. }
            | Self::ResetState { source, .. } => *source,
        }
    }
}

/// Frames and per-frame faults produced by one stage call.
///
/// A frame that fails to decode is skipped rather than aborting the batch;
/// the recorder's gap filling covers the missing samples and the fault is
/// reported upward.
#[derive(Debug, Default)]
pub struct DecodeOutput {
    pub frames: Vec<DecodedFrame>,
    pub faults: Vec<DecodeError>,
}

/// Reorder window plus stateful Opus decoder for one source.
pub struct SourceDecoder {
    source: SourceId,
    decoder: Decoder,
    window: ReorderBuffer,
}

impl SourceDecoder {
    pub fn new(source: SourceId, window_capacity: usize) -> Result<Self, DecodeError> {
        let decoder = Decoder::new(SAMPLE_RATE, Channels::Stereo)
            .map_err(|cause| DecodeError::CreateDecoder { source, cause })?;
        Ok(Self {
            source,
            decoder,
            window: ReorderBuffer::new(window_capacity),
        })
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Offer one compressed frame to the window, decoding whatever the
    /// window releases.
    pub fn submit(&mut self, frame: VoiceFrame) -> DecodeOutput {
        match self.window.offer(frame) {
            Offered::Held => DecodeOutput::default(),
            Offered::Released(batch) => {
                debug!(
                    source = %self.source,
                    released = batch.len(),
                    "reorder window release"
                );
                self.decode_batch(batch)
            }
            Offered::Stale(frame) => {
                debug!(
                    source = %self.source,
                    sequence = frame.sequence,
                    "dropping frame behind reorder window"
                );
                DecodeOutput::default()
            }
        }
    }

    /// Release and decode every held frame in order, then reset codec state.
    pub fn flush(&mut self) -> DecodeOutput {
        let remainder = self.window.flush();
        let mut output = self.decode_batch(remainder);
        if let Err(cause) = self.decoder.reset_state() {
            output.faults.push(DecodeError::ResetState {
                source: self.source,
                cause,
            });
        }
        output
    }

    fn decode_batch(&mut self, batch: Vec<VoiceFrame>) -> DecodeOutput {
        let mut output = DecodeOutput::default();
        for frame in batch {
            match self.decode_one(frame) {
                Ok(decoded) => output.frames.push(decoded),
                Err(fault) => {
                    warn!(source = %self.source, error = %fault, "skipping undecodable frame");
                    output.faults.push(fault);
                }
            }
        }
        output
    }

    fn decode_one(&mut self, frame: VoiceFrame) -> Result<DecodedFrame, DecodeError> {
        let mut pcm = vec![0i16; MAX_FRAME_SAMPLES * CHANNEL_COUNT as usize];
        let sample_frames = self
            .decoder
            .decode(&frame.payload, &mut pcm, false)
            .map_err(|cause| DecodeError::DecodeFrame {
                source: self.source,
                sequence: frame.sequence,
                cause,
            })?;
        pcm.truncate(sample_frames * CHANNEL_COUNT as usize);
        Ok(DecodedFrame {
            source: frame.source,
            timestamp: frame.timestamp,
            received_at: frame.received_at,
            pcm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opus::{Application, Encoder};
    use std::time::Instant;

    const FRAME_SAMPLES: u64 = 960;

    fn encoder() -> Encoder {
        Encoder::new(SAMPLE_RATE, Channels::Stereo, Application::Audio).unwrap()
    }

    fn voice_frame(sequence: u64, payload: Vec<u8>) -> VoiceFrame {
        VoiceFrame {
            source: SourceId::new(42),
            sequence,
            timestamp: sequence * FRAME_SAMPLES,
            payload,
            received_at: Instant::now(),
        }
    }

    fn encoded_frame(encoder: &mut Encoder, sequence: u64) -> VoiceFrame {
        let pcm = vec![0i16; FRAME_SAMPLES as usize * 2];
        let payload = encoder.encode_vec(&pcm, 4000).unwrap();
        voice_frame(sequence, payload)
    }

    #[test]
    fn window_release_decodes_in_sequence_order() {
        let mut enc = encoder();
        let frames: Vec<VoiceFrame> = (0..4).map(|seq| encoded_frame(&mut enc, seq)).collect();
        let mut decoder = SourceDecoder::new(SourceId::new(42), 4).unwrap();

        // Deliver out of order; the fourth frame fills the window.
        let mut released = DecodeOutput::default();
        for index in [1, 0, 3, 2] {
            released = decoder.submit(frames[index].clone());
        }

        assert!(released.faults.is_empty());
        let timestamps: Vec<u64> = released.frames.iter().map(|f| f.timestamp).collect();
        assert_eq!(timestamps, vec![0, FRAME_SAMPLES]);
        for frame in &released.frames {
            assert_eq!(frame.pcm.len(), FRAME_SAMPLES as usize * 2);
        }
    }

    #[test]
    fn flush_decodes_remainder_and_stays_usable() {
        let mut enc = encoder();
        let mut decoder = SourceDecoder::new(SourceId::new(42), 8).unwrap();

        decoder.submit(encoded_frame(&mut enc, 0));
        decoder.submit(encoded_frame(&mut enc, 1));
        let flushed = decoder.flush();
        assert_eq!(flushed.frames.len(), 2);
        assert!(flushed.faults.is_empty());

        // Codec state was reset, not destroyed.
        decoder.submit(encoded_frame(&mut enc, 2));
        let again = decoder.flush();
        assert_eq!(again.frames.len(), 1);
        assert!(again.faults.is_empty());
    }

    #[test]
    fn malformed_payload_faults_only_its_own_frame() {
        let mut enc = encoder();
        let mut decoder = SourceDecoder::new(SourceId::new(42), 8).unwrap();

        decoder.submit(encoded_frame(&mut enc, 0));
        // Code-3 packet declaring 63 frames: more than 120 ms, always invalid.
        decoder.submit(voice_frame(1, vec![0x03, 0xFF]));
        decoder.submit(encoded_frame(&mut enc, 2));

        let output = decoder.flush();
        assert_eq!(output.frames.len(), 2);
        assert_eq!(output.faults.len(), 1);
        assert!(matches!(
            output.faults[0],
            DecodeError::DecodeFrame { sequence: 1, .. }
        ));
    }

    #[test]
    fn stale_frame_is_dropped_without_fault() {
        let mut enc = encoder();
        let mut decoder = SourceDecoder::new(SourceId::new(42), 2).unwrap();

        decoder.submit(encoded_frame(&mut enc, 1));
        let released = decoder.submit(encoded_frame(&mut enc, 2));
        assert_eq!(released.frames.len(), 1);

        let stale = decoder.submit(encoded_frame(&mut enc, 1));
        assert!(stale.frames.is_empty());
        assert!(stale.faults.is_empty());
    }
}
