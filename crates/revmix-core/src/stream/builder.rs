//! Fluent builder for [`AudioStream`].

use super::AudioStream;
use crate::clock::{Clock, SystemClock};
use crate::config::StreamConfig;
use crate::Result;
use std::sync::Arc;

/// Builder for [`AudioStream`].
///
/// ```ignore
/// let stream = AudioStream::builder()
///     .sample_rate(48000)
///     .block_len(512)
///     .pool_size(4)
///     .build()?;
/// ```
pub struct AudioStreamBuilder {
    config: StreamConfig,
    clock: Option<Arc<dyn Clock>>,
    background_fill: bool,
}

impl AudioStreamBuilder {
    pub(crate) fn new() -> Self {
        Self {
            config: StreamConfig::default(),
            clock: None,
            background_fill: true,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 1024
    pub fn block_len(mut self, block_len: usize) -> Self {
        self.config.block_len = block_len;
        self
    }

    /// Default: 3
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.config.pool_size = pool_size;
        self
    }

    /// Default: 1.2
    pub fn compensation_factor(mut self, factor: f64) -> Self {
        self.config.compensation_factor = factor;
        self
    }

    /// Default: [`SystemClock`]
    pub fn clock<C: Clock + 'static>(mut self, clock: Arc<C>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Spawn a fill thread (default), or leave filling to `next_buffer`/`fill`.
    pub fn background_fill(mut self, enabled: bool) -> Self {
        self.background_fill = enabled;
        self
    }

    pub fn build(self) -> Result<AudioStream> {
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock::new()),
        };
        AudioStream::from_parts(self.config, clock, self.background_fill)
    }
}

impl Default for AudioStreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}
