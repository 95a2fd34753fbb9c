//! In-memory PCM clips played back with linear interpolation.

use crate::error::{Error, Result};
use revmix_core::SampleProducer;
use std::sync::Arc;

/// Lowest accepted playback-rate multiplier.
const MIN_PITCH: f32 = 0.01;

/// A mono clip at its own sample rate, resampled to the output rate.
///
/// The sample data is reference-counted so one decoded clip can back many
/// concurrent events.
pub struct ResampledClip {
    samples: Arc<[f32]>,
    source_rate: u32,
    base_step: f64,
    pitch: f32,
    /// Read position in source samples
    cursor: f64,
    expired: bool,
}

impl ResampledClip {
    pub fn new(samples: impl Into<Arc<[f32]>>, source_rate: u32, output_rate: u32) -> Result<Self> {
        let samples = samples.into();
        if samples.is_empty() {
            return Err(Error::EmptyClip);
        }
        if source_rate == 0 {
            return Err(Error::InvalidSampleRate(source_rate));
        }
        if output_rate == 0 {
            return Err(Error::InvalidSampleRate(output_rate));
        }

        Ok(Self {
            samples,
            source_rate,
            base_step: source_rate as f64 / output_rate as f64,
            pitch: 1.0,
            cursor: 0.0,
            expired: false,
        })
    }

    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    /// Source samples consumed per output sample.
    #[inline]
    fn step(&self) -> f64 {
        self.base_step * self.pitch as f64
    }

    #[inline]
    fn next_sample(&mut self) -> Option<f32> {
        let len = self.samples.len();
        let index = self.cursor as usize;
        if index >= len {
            self.expired = true;
            return None;
        }

        let frac = (self.cursor - index as f64) as f32;
        let a = self.samples[index];
        let b = if index + 1 < len { self.samples[index + 1] } else { a };
        self.cursor += self.step();
        if self.cursor as usize >= len {
            self.expired = true;
        }
        Some(a + (b - a) * frac)
    }
}

impl SampleProducer for ResampledClip {
    fn produce(&mut self, out: &mut [f32]) -> usize {
        let mut written = 0;
        for sample in out.iter_mut() {
            match self.next_sample() {
                Some(value) => *sample = value,
                None => break,
            }
            written += 1;
        }
        written
    }

    fn accumulate(&mut self, out: &mut [f32], gain: f32) -> usize {
        let mut written = 0;
        for sample in out.iter_mut() {
            match self.next_sample() {
                Some(value) => *sample += value * gain,
                None => break,
            }
            written += 1;
        }
        written
    }

    fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.source_rate as f64
    }

    fn has_expired(&self) -> bool {
        self.expired
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.max(MIN_PITCH);
    }
}
