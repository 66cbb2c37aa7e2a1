//! Recording removal
//!
//! Sweeps every output file a session left under a prefix, the per-source
//! tracks and the mixdown alike. The sweep keeps going past individual
//! removal failures and reports them all at once.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::domain::AggregateError;

use super::{ends_with_separator, output_dir};

/// Errors from sweeping a session's output files
#[derive(Debug, Error)]
pub enum DiscardError {
    #[error("Failed to list recordings under {path}: {cause}")]
    List {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },

    #[error("Failed to remove recording {path}: {cause}")]
    Remove {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },
}

/// Remove every output file recorded under `prefix`, matching
/// `{prefix}-*.wav` so per-source tracks and the mixdown are swept together.
/// A prefix ending in a path separator names a directory, and the sweep then
/// covers the `-*.wav` files inside it, agreeing with where recording put
/// them.
///
/// Returns the removed paths in name order. A prefix nothing was recorded
/// under (including one whose directory no longer exists) removes nothing
/// and is not an error. Per-file removal failures are collected and the
/// sweep continues past them.
pub async fn remove_session_files(
    prefix: &Path,
) -> Result<Vec<PathBuf>, AggregateError<DiscardError>> {
    let mut needle = OsString::new();
    if !ends_with_separator(prefix) {
        match prefix.file_name() {
            Some(stem) => needle.push(stem),
            None => return Ok(Vec::new()),
        }
    }
    needle.push("-");
    let dir = output_dir(prefix);

    let mut errors = AggregateError::new();
    let mut matched = Vec::new();
    match fs::read_dir(dir).await {
        Ok(mut entries) => loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name();
                    let bytes = name.as_encoded_bytes();
                    if bytes.starts_with(needle.as_encoded_bytes()) && bytes.ends_with(b".wav") {
                        matched.push(entry.path());
                    }
                }
                Ok(None) => break,
                Err(cause) => {
                    errors.push(DiscardError::List {
                        path: dir.to_path_buf(),
                        cause,
                    });
                    break;
                }
            }
        },
        Err(cause) if cause.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(cause) => {
            errors.push(DiscardError::List {
                path: dir.to_path_buf(),
                cause,
            });
        }
    }

    matched.sort();
    let mut removed = Vec::with_capacity(matched.len());
    for path in matched {
        debug!(path = %path.display(), "removing recording");
        match fs::remove_file(&path).await {
            Ok(()) => removed.push(path),
            Err(cause) => errors.push(DiscardError::Remove { path, cause }),
        }
    }

    errors.into_result()?;
    Ok(removed)
}
