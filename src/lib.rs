//! # revmix - Real-time Engine Sound Mixer
//!
//! Turns independently scheduled sound events into a continuous, gap-free
//! sample stream for an audio device.
//!
//! ## Architecture
//!
//! revmix is an umbrella crate over:
//! - **revmix-core** - Producers, events, inserts, buffer pool, mixer, audio streams
//! - **revmix-synth** - Procedural kick, wind noise, log-driven exhaust, resampled clips
//! - **revmix-output** - Device voices, virtual and cpal devices, playback backend
//!
//! ## Quick Start
//!
//! ```ignore
//! use revmix::prelude::*;
//! use std::sync::Arc;
//!
//! let stream = Arc::new(AudioStream::builder().sample_rate(44100).build()?);
//!
//! let mut backend = PlaybackBackend::open(BackendConfig::default())?;
//! backend.add_stream(Arc::clone(&stream))?;
//! backend.start()?;
//!
//! let wind = FilteredNoise::new(44100);
//! let control = wind.control();
//! stream.play(PlaybackEvent::new(wind));
//! control.set_intensity(60.0);
//!
//! stream.play_in(PlaybackEvent::new(ProceduralKick::new(KickParams::default(), 44100)), 0.1);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - `synth` + `cpal`
//! - `synth` - Built-in producers
//! - `cpal` - Hardware output (the virtual device is always available)

/// Re-export of revmix-core for direct access
pub use revmix_core as core;

/// Re-export of revmix-output for direct access
pub use revmix_output as output;

#[cfg(feature = "synth")]
pub use revmix_synth as synth;

pub use revmix_core::{
    shared, AudioFilter, AudioStream, AudioStreamBuilder, BlockReport, BufferPool, Clock,
    InsertId, LowPassFilter, ManualClock, Mixer, PlaybackBuffer, PlaybackEvent, PoolOccupancy,
    ProducerHandle, SampleProducer, SharedProducer, StreamConfig, StreamMetricsSnapshot,
    SystemClock,
};

pub use revmix_output::{
    AudioDevice, BackendConfig, BackendMetricsSnapshot, DeviceVoice, PlaybackBackend, StreamId,
    VirtualDevice, VirtualDeviceHandle, VoiceState,
};

#[cfg(feature = "cpal")]
pub use revmix_output::CpalDevice;

#[cfg(feature = "synth")]
pub use revmix_synth::{
    engine_log, EngineLogWriter, FilteredNoise, KickParams, LogDrivenSynth, LogEntry,
    ProceduralKick, ResampledClip, WindControl,
};

mod error;
pub use error::{Error, Result};

/// Common imports.
pub mod prelude {
    pub use crate::{Error, Result};

    pub use revmix_core::{
        AudioStream, InsertId, LowPassFilter, ManualClock, PlaybackEvent, SampleProducer,
        StreamConfig,
    };

    pub use revmix_output::{BackendConfig, PlaybackBackend, VirtualDevice};

    #[cfg(feature = "cpal")]
    pub use revmix_output::CpalDevice;

    #[cfg(feature = "synth")]
    pub use revmix_synth::{
        engine_log, FilteredNoise, KickParams, LogDrivenSynth, LogEntry, ProceduralKick,
        ResampledClip,
    };
}
