//! Wind noise: low-passed white noise whose brightness and level follow an
//! externally driven intensity (typically vehicle speed).
//!
//! The producer is static, so overrun recovery never evicts it. Its owner
//! keeps a [`WindControl`] to move the intensity and to retire it.

use crate::noise::NoiseSource;
use revmix_core::{AtomicFlag, AtomicFloat, ButterworthLowpass, SampleProducer};
use std::sync::Arc;

/// How intensity maps to filter cutoff and output level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindParams {
    /// Cutoff in Hz per unit of intensity (default: 4.25)
    pub cutoff_per_unit: f64,
    /// Intensity that reaches full scale before the level cap (default: 150)
    pub full_scale: f32,
    /// Level cap (default: 0.9)
    pub max_level: f32,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            cutoff_per_unit: 4.25,
            full_scale: 150.0,
            max_level: 0.9,
        }
    }
}

/// Thread-safe handle for driving a [`FilteredNoise`] from outside the mixer.
#[derive(Debug, Clone)]
pub struct WindControl {
    intensity: Arc<AtomicFloat>,
    expired: Arc<AtomicFlag>,
}

impl WindControl {
    pub fn set_intensity(&self, intensity: f32) {
        self.intensity.set(intensity.max(0.0));
    }

    pub fn intensity(&self) -> f32 {
        self.intensity.get()
    }

    /// Retire the producer. The mixer drops it on its next pass.
    pub fn expire(&self) {
        self.expired.set(true);
    }

    pub fn is_expired(&self) -> bool {
        self.expired.get()
    }
}

pub struct FilteredNoise {
    control: WindControl,
    params: WindParams,
    filter: ButterworthLowpass,
    noise: NoiseSource,
}

impl FilteredNoise {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_params(sample_rate, WindParams::default(), NoiseSource::from_entropy())
    }

    pub fn with_params(sample_rate: u32, params: WindParams, noise: NoiseSource) -> Self {
        Self {
            control: WindControl {
                intensity: Arc::new(AtomicFloat::new(0.0)),
                expired: Arc::new(AtomicFlag::new(false)),
            },
            params,
            filter: ButterworthLowpass::new(sample_rate as f64, 1.0),
            noise,
        }
    }

    pub fn control(&self) -> WindControl {
        self.control.clone()
    }

    /// Pick up the current intensity. Returns the output level for this block.
    fn update(&mut self) -> f32 {
        let intensity = self.control.intensity();
        self.filter
            .set_cutoff(intensity as f64 * self.params.cutoff_per_unit);
        (intensity / self.params.full_scale).min(self.params.max_level)
    }

    #[inline]
    fn next_sample(&mut self, level: f32) -> f32 {
        self.filter.process(self.noise.bipolar() as f64) as f32 * level
    }
}

impl SampleProducer for FilteredNoise {
    fn produce(&mut self, out: &mut [f32]) -> usize {
        let level = self.update();
        for sample in out.iter_mut() {
            *sample = self.next_sample(level);
        }
        out.len()
    }

    fn accumulate(&mut self, out: &mut [f32], gain: f32) -> usize {
        let level = self.update() * gain;
        for sample in out.iter_mut() {
            *sample += self.next_sample(level);
        }
        out.len()
    }

    fn duration(&self) -> f64 {
        0.0
    }

    fn has_expired(&self) -> bool {
        self.control.is_expired()
    }
}
