//! Track storage infrastructure module
//!
//! WAV container conventions shared by the per-source writers and the
//! mixdown engine: the fixed output format, the output naming scheme, and
//! the sweep that removes a session's outputs again.

mod discard;
mod track;

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec};

use crate::domain::{SourceId, BITS_PER_SAMPLE, CHANNEL_COUNT, SAMPLE_RATE};

pub use discard::{remove_session_files, DiscardError};
pub use track::{TrackFile, TrackWriter, WriteError};

/// The fixed output container format: 48 kHz, 16-bit, stereo PCM.
pub fn wav_spec() -> WavSpec {
    WavSpec {
        channels: CHANNEL_COUNT,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Per-source track path: `{prefix}-{source}.wav`.
pub fn track_path(prefix: &Path, source: SourceId) -> PathBuf {
    suffixed(prefix, &format!("-{source}.wav"))
}

/// Combined output path: `{prefix}-mix.wav`.
pub fn mix_path(prefix: &Path) -> PathBuf {
    suffixed(prefix, "-mix.wav")
}

/// Directory a prefix's output files land in.
///
/// The suffixes in [`track_path`]/[`mix_path`] are appended verbatim, so a
/// prefix ending in a path separator names the output directory itself and
/// the files inside it start at their `-` suffix (`calls/-7.wav`). Any other
/// prefix's final component is a file-name stem and the outputs land next
/// to it.
pub fn output_dir(prefix: &Path) -> &Path {
    if ends_with_separator(prefix) {
        return prefix;
    }
    match prefix.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Whether the prefix names a directory rather than a file-name stem.
/// `Path::file_name` ignores trailing separators, so check the raw bytes.
fn ends_with_separator(prefix: &Path) -> bool {
    prefix
        .as_os_str()
        .as_encoded_bytes()
        .last()
        .is_some_and(|&byte| std::path::is_separator(byte as char))
}

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_path_appends_source_id() {
        let path = track_path(Path::new("/tmp/call/session"), SourceId::new(814));
        assert_eq!(path, PathBuf::from("/tmp/call/session-814.wav"));
    }

    #[test]
    fn mix_path_appends_fixed_suffix() {
        let path = mix_path(Path::new("out/rec"));
        assert_eq!(path, PathBuf::from("out/rec-mix.wav"));
    }

    #[test]
    fn track_path_under_a_directory_prefix_lands_inside_it() {
        let path = track_path(Path::new("out/calls/"), SourceId::new(7));
        assert_eq!(path, PathBuf::from("out/calls/-7.wav"));
    }

    #[test]
    fn output_dir_of_a_stem_prefix_is_its_parent() {
        assert_eq!(output_dir(Path::new("out/rec")), Path::new("out"));
        assert_eq!(output_dir(Path::new("rec")), Path::new("."));
    }

    #[test]
    fn output_dir_of_a_directory_prefix_is_the_directory() {
        assert_eq!(output_dir(Path::new("out/calls/")), Path::new("out/calls"));
    }

    #[test]
    fn output_format_is_48k_stereo_16_bit() {
        let spec = wav_spec();
        assert_eq!(spec.sample_rate, 48_000);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
    }
}
