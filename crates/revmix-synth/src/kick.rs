//! Procedural kick drum.
//!
//! A sine whose frequency sweeps down from a pitch-dependent peak, plus a
//! short burst of noise, under a linear fade to silence over the kick's
//! duration. Everything except the noise is a pure function of the sample
//! index.

use crate::noise::NoiseSource;
use crate::{Error, Result};
use revmix_core::SampleProducer;
use std::f64::consts::PI;

/// Kick shape, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KickParams {
    /// 0..1, maps to a 80..680 Hz sweep peak
    pub pitch: f32,
    /// 0..1, maps to how quickly the noise burst decays
    pub decay: f32,
    /// Output level multiplier (default: 1.0)
    pub drive: f32,
    /// Length in seconds (default: 0.25)
    pub duration: f64,
}

impl Default for KickParams {
    fn default() -> Self {
        Self {
            pitch: 0.5,
            decay: 0.5,
            drive: 1.0,
            duration: 0.25,
        }
    }
}

impl KickParams {
    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "kick duration {} must be a positive number of seconds",
                self.duration
            )));
        }
        if !self.pitch.is_finite() || !self.decay.is_finite() || !self.drive.is_finite() {
            return Err(Error::InvalidConfig(
                "kick pitch, decay and drive must be finite".into(),
            ));
        }
        Ok(())
    }
}

const TONE_LEVEL: f64 = 0.276;
const NOISE_LEVEL: f64 = 0.045;

pub struct ProceduralKick {
    sweep: f64,
    noise_decay: f64,
    drive: f32,
    duration: f64,
    sample_rate: f64,
    total_samples: usize,
    position: usize,
    expired: bool,
    noise: NoiseSource,
}

impl ProceduralKick {
    pub fn new(params: KickParams, sample_rate: u32) -> Self {
        Self::with_noise(params, sample_rate, NoiseSource::from_entropy())
    }

    /// Like [`new`](Self::new), but rejects unusable parameters instead of
    /// clamping them.
    pub fn try_new(params: KickParams, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate(sample_rate));
        }
        params.validate()?;
        Ok(Self::new(params, sample_rate))
    }

    pub fn with_noise(params: KickParams, sample_rate: u32, noise: NoiseSource) -> Self {
        let sample_rate = sample_rate as f64;
        let duration = params.duration.max(0.0);
        let total_samples = (duration * sample_rate).round() as usize;

        Self {
            sweep: 80.0 + params.pitch as f64 * 600.0,
            noise_decay: 20.0 + params.decay as f64 * 180.0,
            drive: params.drive,
            duration,
            sample_rate,
            total_samples,
            position: 0,
            expired: total_samples == 0,
            noise,
        }
    }

    /// Samples still to be rendered.
    pub fn remaining(&self) -> usize {
        self.total_samples - self.position
    }

    /// Hyperbolic decay `1 / (10 t + 1)` at sample index `x`.
    #[inline]
    fn decay(&self, x: f64) -> f64 {
        1.0 / (10.0 * x / self.sample_rate + 1.0)
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        let n = self.position as f64;
        let frequency = 50.0 + self.sweep * self.decay(n * 50.0);
        let mut sample = (n * PI * frequency / self.sample_rate).sin() * TONE_LEVEL * self.decay(n * 6.0);
        sample += self.noise.bipolar() as f64 * NOISE_LEVEL * self.decay(n * self.noise_decay * 2.0);
        sample *= 1.0 - n / self.total_samples as f64;
        self.position += 1;
        sample as f32 * self.drive
    }

    /// Clip a request to the remaining length and mark expiry if it reaches the end.
    #[inline]
    fn take(&mut self, requested: usize) -> usize {
        let n = requested.min(self.remaining());
        if self.position + n >= self.total_samples {
            self.expired = true;
        }
        n
    }
}

impl SampleProducer for ProceduralKick {
    fn produce(&mut self, out: &mut [f32]) -> usize {
        let n = self.take(out.len());
        for sample in &mut out[..n] {
            *sample = self.next_sample();
        }
        n
    }

    fn accumulate(&mut self, out: &mut [f32], gain: f32) -> usize {
        let n = self.take(out.len());
        for sample in &mut out[..n] {
            *sample += self.next_sample() * gain;
        }
        n
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn has_expired(&self) -> bool {
        self.expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kick(sample_rate: u32) -> ProceduralKick {
        ProceduralKick::with_noise(KickParams::default(), sample_rate, NoiseSource::seeded(1))
    }

    #[test]
    fn test_try_new_rejects_bad_params() {
        let negative = KickParams {
            duration: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            ProceduralKick::try_new(negative, 48000),
            Err(Error::InvalidConfig(_))
        ));

        let nan = KickParams {
            duration: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());

        assert!(matches!(
            ProceduralKick::try_new(KickParams::default(), 0),
            Err(Error::InvalidSampleRate(0))
        ));
        assert!(ProceduralKick::try_new(KickParams::default(), 48000).is_ok());
    }

    #[test]
    fn test_length_matches_duration() {
        let mut kick = kick(48000);
        let mut out = vec![0.0f32; 1000];
        let mut total = 0;
        while !kick.has_expired() {
            total += kick.produce(&mut out);
        }
        assert_eq!(total, 12000);
        assert_eq!(kick.produce(&mut out), 0);
    }

    #[test]
    fn test_starts_silent_and_stays_bounded() {
        let mut kick = kick(44100);
        let mut out = vec![0.0f32; 11025];
        kick.produce(&mut out);
        assert!(out[0].abs() <= NOISE_LEVEL as f32);
        assert!(out.iter().all(|s| s.abs() < 0.5));
        assert!(out.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn test_fades_out() {
        let mut kick = kick(44100);
        let mut out = vec![0.0f32; 11025];
        kick.produce(&mut out);
        let tail = &out[out.len() - 100..];
        assert!(tail.iter().all(|s| s.abs() < 0.01));
    }

    #[test]
    fn test_accumulate_adds_with_gain() {
        let mut a = kick(44100);
        let mut b = kick(44100);
        let mut plain = vec![0.0f32; 256];
        a.produce(&mut plain);

        let mut mixed = vec![1.0f32; 256];
        b.accumulate(&mut mixed, 0.5);
        for (m, p) in mixed.iter().zip(&plain) {
            assert!((m - (1.0 + p * 0.5)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_is_not_static() {
        assert!(!kick(44100).is_static());
        assert_eq!(kick(44100).duration(), 0.25);
    }
}
