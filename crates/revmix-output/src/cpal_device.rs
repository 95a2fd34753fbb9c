//! Hardware output through cpal.
//!
//! Every voice is its own cpal output stream. The stream callback pulls
//! samples from the voice queue and writes them to all channels; while the
//! queue is starved (or locked by the backend) it writes silence.

use crate::device::{AudioDevice, DeviceVoice, VoiceConfig, VoiceQueue, VoiceState};
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Wrapper to hold a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` on some platforms. The stream is created and
/// dropped with its [`CpalVoice`], which the backend only touches behind its
/// channel lock, so it is never accessed from two threads at once.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

// SAFETY: see above; the handle is only moved with its owning voice and
// never shared.
unsafe impl Send for StreamHandle {}

pub struct CpalDevice {
    device: cpal::Device,
    name: String,
}

impl CpalDevice {
    /// Open an output device by index, or the host default.
    pub fn open(index: Option<usize>) -> Result<Self> {
        let device = get_device(index)?;
        let name = device.name()?;
        debug!(device = %name, "opened output device");
        Ok(Self { device, name })
    }

    /// List available output devices as `"index: name"`.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        host.output_devices()?
            .enumerate()
            .map(|(idx, device)| Ok(format!("{}: {}", idx, device.name()?)))
            .collect()
    }

    fn build_stream<T>(
        &self,
        config: &cpal::StreamConfig,
        queue: Arc<Mutex<VoiceQueue>>,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<i16>,
    {
        let channels = (config.channels as usize).max(1);

        let stream = self.device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let Some(mut queue) = queue.try_lock() else {
                    data.fill(T::EQUILIBRIUM);
                    return;
                };
                for frame in data.chunks_mut(channels) {
                    let value = T::from_sample(queue.next_sample().unwrap_or(0));
                    frame.fill(value);
                }
            },
            |err| warn!(%err, "output stream error"),
            None,
        )?;

        Ok(stream)
    }
}

impl AudioDevice for CpalDevice {
    type Voice = CpalVoice;

    fn name(&self) -> &str {
        &self.name
    }

    fn create_voice(&mut self, config: VoiceConfig) -> Result<CpalVoice> {
        let default_config = self.device.default_output_config()?;
        let stream_config = cpal::StreamConfig {
            channels: default_config.channels(),
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = Arc::new(Mutex::new(VoiceQueue::primed(config)));
        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(&stream_config, Arc::clone(&queue))?,
            cpal::SampleFormat::I16 => self.build_stream::<i16>(&stream_config, Arc::clone(&queue))?,
            cpal::SampleFormat::U16 => self.build_stream::<u16>(&stream_config, Arc::clone(&queue))?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {format:?}"
                )));
            }
        };
        stream.play()?;

        debug!(
            device = %self.name,
            sample_rate = config.sample_rate,
            channels = stream_config.channels,
            "voice started"
        );

        Ok(CpalVoice {
            queue,
            _stream: StreamHandle(stream),
        })
    }
}

pub struct CpalVoice {
    queue: Arc<Mutex<VoiceQueue>>,
    _stream: StreamHandle,
}

impl DeviceVoice for CpalVoice {
    fn processed(&mut self) -> usize {
        self.queue.lock().processed_len()
    }

    fn requeue(&mut self, samples: &[i16]) -> Result<()> {
        self.queue.lock().requeue(samples)
    }

    fn state(&self) -> VoiceState {
        self.queue.lock().state()
    }

    fn play(&mut self) -> Result<()> {
        self.queue.lock().play();
        Ok(())
    }
}

fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    if let Some(idx) = index {
        let devices: Vec<_> = host.output_devices()?.collect();
        let device_count = devices.len();
        devices.into_iter().nth(idx).ok_or_else(|| {
            Error::InvalidDevice(format!(
                "Output device index {} out of range (available: {})",
                idx, device_count
            ))
        })
    } else {
        host.default_output_device()
            .ok_or_else(|| Error::InvalidDevice("No output device available".to_string()))
    }
}
