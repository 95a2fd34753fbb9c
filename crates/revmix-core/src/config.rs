//! Audio stream configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an [`AudioStream`](crate::AudioStream) and its mixer.
///
/// The overrun threshold and late tolerance are hand-tuned; they are exposed
/// here rather than derived because the right values depend on how reliably
/// the host schedules the fill thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Output sample rate in Hz (default: 44100)
    pub sample_rate: u32,
    /// Samples per pool buffer (default: 1024)
    pub block_len: usize,
    /// Number of pool buffers (default: 3)
    pub pool_size: usize,
    /// Lead time multiplier over `pool_size` blocks (default: 1.2, must be > 1)
    pub compensation_factor: f64,
    /// Resync when the wall clock runs this many compensation delays ahead
    /// of the render cursor (default: 2.0)
    pub overrun_threshold: f64,
    /// How far behind the render cursor, in blocks, an event may be and still
    /// start (default: 1.0)
    pub late_tolerance: f64,
    /// The fill thread wakes every `block_duration / fill_wake_divisor` (default: 4)
    pub fill_wake_divisor: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_len: 1024,
            pool_size: 3,
            compensation_factor: 1.2,
            overrun_threshold: 2.0,
            late_tolerance: 1.0,
            fill_wake_divisor: 4,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000..=384_000).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.block_len == 0 {
            return Err(Error::InvalidConfig("block_len must be non-zero".into()));
        }
        if self.pool_size < 2 {
            return Err(Error::InvalidConfig(format!(
                "pool_size {} too small (minimum 2)",
                self.pool_size
            )));
        }
        if self.compensation_factor.is_nan() || self.compensation_factor <= 1.0 {
            return Err(Error::InvalidConfig(format!(
                "compensation_factor {} must be greater than 1.0",
                self.compensation_factor
            )));
        }
        if self.overrun_threshold.is_nan() || self.overrun_threshold <= 1.0 {
            return Err(Error::InvalidConfig(format!(
                "overrun_threshold {} must be greater than 1.0",
                self.overrun_threshold
            )));
        }
        if self.late_tolerance.is_nan() || self.late_tolerance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "late_tolerance {} must be non-negative",
                self.late_tolerance
            )));
        }
        if self.fill_wake_divisor == 0 {
            return Err(Error::InvalidConfig(
                "fill_wake_divisor must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Duration of one pool buffer in seconds.
    #[inline]
    pub fn block_duration(&self) -> f64 {
        self.block_len as f64 / self.sample_rate as f64
    }

    /// Lead time the mixer keeps between its render cursor and the wall clock.
    #[inline]
    pub fn compensation_delay(&self) -> f64 {
        self.block_duration() * self.pool_size as f64 * self.compensation_factor
    }

    /// Maximum sleep of the fill thread between polls.
    pub fn fill_wake_interval(&self) -> Duration {
        Duration::from_secs_f64(self.block_duration() / self.fill_wake_divisor as f64)
    }
}
