//! Test helpers and fixtures for revmix integration tests.
//!
//! Everything runs against [`ManualClock`] and [`VirtualDevice`], so no test
//! needs audio hardware or real time to pass.

#![allow(dead_code)]

pub mod tolerances;

use revmix::prelude::*;
use std::sync::Arc;

/// Rate used by the end-to-end timing scenarios.
pub const TEST_SAMPLE_RATE: u32 = 88200;

/// Block length used by the end-to-end timing scenarios.
pub const TEST_BLOCK_LEN: usize = 1024;

/// Producer that writes a constant for a fixed number of samples, or forever
/// when static.
pub struct Constant {
    value: f32,
    remaining: usize,
    is_static: bool,
}

impl Constant {
    pub fn new(value: f32, samples: usize) -> Self {
        Self {
            value,
            remaining: samples,
            is_static: false,
        }
    }

    pub fn ambient(value: f32) -> Self {
        Self {
            value,
            remaining: usize::MAX,
            is_static: true,
        }
    }
}

impl SampleProducer for Constant {
    fn produce(&mut self, out: &mut [f32]) -> usize {
        let n = out.len().min(self.remaining);
        out[..n].fill(self.value);
        self.remaining -= n;
        n
    }

    fn accumulate(&mut self, out: &mut [f32], gain: f32) -> usize {
        let n = out.len().min(self.remaining);
        for sample in &mut out[..n] {
            *sample += self.value * gain;
        }
        self.remaining -= n;
        n
    }

    fn duration(&self) -> f64 {
        if self.is_static {
            0.0
        } else {
            10.0
        }
    }

    fn has_expired(&self) -> bool {
        self.remaining == 0
    }
}

/// Quantized value of a mix level.
pub fn q(level: f32) -> i16 {
    (level.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Assert two quantized samples differ by at most one step.
pub fn assert_sample_near(actual: i16, expected: i16, index: usize) {
    let diff = (actual as i32 - expected as i32).abs();
    assert!(
        diff <= tolerances::INT16_LSB,
        "sample {index}: got {actual}, expected {expected}"
    );
}

pub fn is_silent(samples: &[i16]) -> bool {
    samples
        .iter()
        .all(|s| s.abs() <= tolerances::SILENCE_THRESHOLD)
}

pub fn test_config() -> StreamConfig {
    StreamConfig {
        sample_rate: TEST_SAMPLE_RATE,
        block_len: TEST_BLOCK_LEN,
        ..Default::default()
    }
}

/// Stream on a manual clock without a fill thread.
pub fn manual_stream(config: StreamConfig, clock: &Arc<ManualClock>) -> AudioStream {
    AudioStream::builder()
        .config(config)
        .clock(Arc::clone(clock))
        .background_fill(false)
        .build()
        .expect("valid stream config")
}

/// Install a fmt subscriber honouring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
