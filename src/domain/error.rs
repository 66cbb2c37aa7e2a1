//! Domain error types
//!
//! Close, drain, and mixdown each touch many independent resources; one
//! failure must not hide the rest. `AggregateError` collects every underlying
//! error from one such pass and reports them together.

use std::error::Error;
use std::fmt;

use thiserror::Error as ThisError;

/// Error when session tuning values are invalid
#[derive(Debug, Clone, ThisError)]
pub enum ConfigError {
    #[error("Invalid config value for '{key}': {message}")]
    ValidationError {
        key: &'static str,
        message: String,
    },
}

/// Multiple independent failures from a single close/drain/mixdown pass.
///
/// Preserves every underlying error instead of only the first, so a failure
/// finalizing one track never hides the others.
#[derive(Debug)]
pub struct AggregateError<E> {
    errors: Vec<E>,
}

impl<E> AggregateError<E> {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: E) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }

    /// `Ok(())` when nothing was collected, otherwise the aggregate itself.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl<E> Default for AggregateError<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> From<Vec<E>> for AggregateError<E> {
    fn from(errors: Vec<E>) -> Self {
        Self { errors }
    }
}

impl<E> Extend<E> for AggregateError<E> {
    fn extend<T: IntoIterator<Item = E>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl<E: fmt::Display> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 {
            "error"
        } else {
            "errors"
        };
        write!(f, "{} {}: ", self.errors.len(), noun)?;
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl<E: Error + 'static> Error for AggregateError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.errors.first().map(|e| e as &(dyn Error + 'static))
    }
}
