//! Render configuration.

use reel_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::sizing::{MAX_BUFFER_BYTES, MIN_BUFFER_BYTES};

/// Tunables for a render session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Amount of audio each ingest buffer should hold, in seconds.
    pub buffer_seconds: f64,
    /// Lower bound for the ingest buffer, in bytes.
    pub min_buffer_bytes: u32,
    /// Upper bound for the ingest buffer, in bytes.
    pub max_buffer_bytes: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            buffer_seconds: 1.0,
            min_buffer_bytes: MIN_BUFFER_BYTES,
            max_buffer_bytes: MAX_BUFFER_BYTES,
        }
    }
}

impl RenderConfig {
    /// Check that the values describe a usable buffer range.
    pub fn validate(&self) -> Result<()> {
        if !self.buffer_seconds.is_finite() || self.buffer_seconds <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "buffer duration must be positive, got {}",
                self.buffer_seconds
            )));
        }
        if self.min_buffer_bytes == 0 {
            return Err(Error::InvalidArgument(
                "minimum buffer size must be non-zero".to_string(),
            ));
        }
        if self.min_buffer_bytes > self.max_buffer_bytes {
            return Err(Error::InvalidArgument(format!(
                "minimum buffer size {} exceeds maximum {}",
                self.min_buffer_bytes, self.max_buffer_bytes
            )));
        }
        Ok(())
    }
}
