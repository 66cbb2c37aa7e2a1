//! Session tuning configuration

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::mix::{Attenuation, DEFAULT_ATTENUATION_DB};

/// Tuning knobs for one recording session.
///
/// Every queue is bounded so a stalled stage back-pressures its producer
/// instead of buffering without limit. Defaults match the sizes the pipeline
/// was tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reorder window capacity per source, in frames.
    pub reorder_capacity: usize,
    /// Router to decoder queue depth per source, in frames.
    pub frame_queue_depth: usize,
    /// Decoder to recorder queue depth per source, in frames.
    pub decoded_queue_depth: usize,
    /// Producer to combiner queue depth per track during mixdown, in samples.
    pub mixdown_queue_depth: usize,
    /// Mixdown cut per contributing track, in decibels of reduction.
    pub attenuation_db: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reorder_capacity: 8,
            frame_queue_depth: 32,
            decoded_queue_depth: 32,
            mixdown_queue_depth: 64,
            attenuation_db: DEFAULT_ATTENUATION_DB,
        }
    }
}

impl SessionConfig {
    /// Check that every tuning value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reorder_capacity < 2 {
            return Err(ConfigError::ValidationError {
                key: "reorder_capacity",
                message: format!("must be at least 2, got {}", self.reorder_capacity),
            });
        }
        let depths = [
            ("frame_queue_depth", self.frame_queue_depth),
            ("decoded_queue_depth", self.decoded_queue_depth),
            ("mixdown_queue_depth", self.mixdown_queue_depth),
        ];
        for (key, depth) in depths {
            if depth == 0 {
                return Err(ConfigError::ValidationError {
                    key,
                    message: "queue depth must be at least 1".to_string(),
                });
            }
        }
        if !self.attenuation_db.is_finite() || self.attenuation_db < 0.0 {
            return Err(ConfigError::ValidationError {
                key: "attenuation_db",
                message: format!("must be a finite cut in dB, got {}", self.attenuation_db),
            });
        }
        Ok(())
    }

    /// The mixdown attenuation as a linear factor.
    pub fn attenuation(&self) -> Attenuation {
        Attenuation::from_db(self.attenuation_db)
    }
}
