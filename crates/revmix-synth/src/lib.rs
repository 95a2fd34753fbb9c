//! Sample producers for revmix.
//!
//! - [`ProceduralKick`]: one-shot percussive transient.
//! - [`FilteredNoise`]: wind noise steered through a [`WindControl`].
//! - [`LogDrivenSynth`]: exhaust noise fed by a physics log ([`engine_log`]).
//! - [`ResampledClip`]: in-memory PCM at any source rate.
//!
//! All of them implement [`revmix_core::SampleProducer`].

pub mod clip;
pub mod error;
pub mod exhaust;
pub mod kick;
pub mod noise;
pub mod wind;

pub use clip::ResampledClip;
pub use error::{Error, Result};
pub use exhaust::{
    engine_log, EngineLogReader, EngineLogWriter, ExhaustParams, LogDrivenSynth, LogEntry,
};
pub use kick::{KickParams, ProceduralKick};
pub use noise::NoiseSource;
pub use wind::{FilteredNoise, WindControl, WindParams};
