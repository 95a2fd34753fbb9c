//! Device output for revmix streams.
//!
//! [`PlaybackBackend`] drains one or more [`AudioStream`](revmix_core::AudioStream)s
//! into voices of an [`AudioDevice`], refilling device buffers as they are
//! played and restarting voices that starve.
//!
//! Devices:
//! - [`VirtualDevice`]: deterministic, advanced by hand; for tests and offline use.
//! - `CpalDevice` (feature `cpal`, on by default): the host's audio output.

pub mod backend;
pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod virtual_device;

#[cfg(feature = "cpal")]
pub mod cpal_device;

pub use backend::{PlaybackBackend, PlaybackBackendBuilder, StreamId};
pub use config::BackendConfig;
pub use device::{AudioDevice, DeviceVoice, VoiceConfig, VoiceState};
pub use error::{Error, Result};
pub use metrics::{BackendMetrics, BackendMetricsSnapshot};
pub use virtual_device::{VirtualDevice, VirtualDeviceHandle, VirtualVoice};

#[cfg(feature = "cpal")]
pub use cpal_device::{CpalDevice, CpalVoice};
