//! Playback backend: moves mixed blocks from streams onto device voices.
//!
//! Each registered [`AudioStream`] gets its own voice. A service pass walks
//! every voice, refills the buffers it has finished playing with the stream's
//! next blocks, and restarts voices that starved in the meantime. Passes run
//! on a background thread after [`PlaybackBackend::start`], or whenever the
//! caller invokes [`PlaybackBackend::service`].

use crate::config::BackendConfig;
use crate::device::{AudioDevice, DeviceVoice, VoiceConfig, VoiceState};
use crate::metrics::{BackendMetrics, BackendMetricsSnapshot};
use crate::{Error, Result};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use revmix_core::AudioStream;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Identifies a stream registered with a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

struct StreamChannel<V> {
    id: StreamId,
    stream: Arc<AudioStream>,
    voice: V,
    underruns: u64,
}

struct BackendShared<D: AudioDevice> {
    device: Mutex<D>,
    channels: Mutex<Vec<StreamChannel<D::Voice>>>,
    metrics: BackendMetrics,
    config: BackendConfig,
    next_id: AtomicU64,
}

/// Fallback block duration for the service interval while no stream is registered.
const IDLE_BLOCK_DURATION: f64 = 1024.0 / 44100.0;

impl<D: AudioDevice> BackendShared<D> {
    fn service(&self) -> usize {
        let mut submitted = 0;
        let mut channels = self.channels.lock();

        for channel in channels.iter_mut() {
            let processed = channel.voice.processed();
            for _ in 0..processed {
                let Some(buffer) = channel.stream.next_buffer() else {
                    self.metrics.record_missed();
                    break;
                };
                if let Err(err) = channel.voice.requeue(&buffer) {
                    warn!(stream = %channel.id, %err, "requeue failed");
                    break;
                }
                submitted += 1;
            }

            if channel.voice.state() == VoiceState::Stopped {
                channel.underruns += 1;
                self.metrics.record_underrun();
                warn!(
                    stream = %channel.id,
                    underruns = channel.underruns,
                    "voice starved, restarting"
                );
                if let Err(err) = channel.voice.play() {
                    warn!(stream = %channel.id, %err, "voice restart failed");
                }
            }
        }

        self.metrics.record_submitted(submitted);
        self.metrics.record_tick();
        submitted
    }

    fn service_interval(&self) -> Duration {
        let block_duration = self
            .channels
            .lock()
            .iter()
            .map(|channel| channel.stream.config().block_duration())
            .fold(f64::INFINITY, f64::min);
        let block_duration = if block_duration.is_finite() {
            block_duration
        } else {
            IDLE_BLOCK_DURATION
        };
        self.config.service_interval(block_duration)
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn shutdown(self) {
        let _ = self.stop_tx.send(());
        let _ = self.handle.join();
    }
}

/// Feeds one or more [`AudioStream`]s to an [`AudioDevice`].
///
/// # Example
///
/// ```
/// use revmix_core::AudioStream;
/// use revmix_output::{PlaybackBackend, VirtualDevice};
/// use std::sync::Arc;
///
/// let device = VirtualDevice::new();
/// let clock = device.handle();
/// let backend = PlaybackBackend::builder(device).build().unwrap();
///
/// let stream = Arc::new(AudioStream::builder().background_fill(false).build().unwrap());
/// backend.add_stream(Arc::clone(&stream)).unwrap();
///
/// clock.advance(1024);
/// assert_eq!(backend.service(), 1);
/// ```
pub struct PlaybackBackend<D: AudioDevice> {
    shared: Arc<BackendShared<D>>,
    worker: Option<Worker>,
}

impl<D: AudioDevice + 'static> PlaybackBackend<D> {
    pub fn builder(device: D) -> PlaybackBackendBuilder<D> {
        PlaybackBackendBuilder {
            device,
            config: BackendConfig::default(),
        }
    }

    pub fn new(device: D, config: BackendConfig) -> Result<Self> {
        config.validate()?;
        debug!(device = device.name(), ?config, "playback backend created");

        Ok(Self {
            shared: Arc::new(BackendShared {
                device: Mutex::new(device),
                channels: Mutex::new(Vec::new()),
                metrics: BackendMetrics::new(),
                config,
                next_id: AtomicU64::new(0),
            }),
            worker: None,
        })
    }

    /// Register a stream and open a voice for it, primed with silence.
    pub fn add_stream(&self, stream: Arc<AudioStream>) -> Result<StreamId> {
        let voice_config = VoiceConfig {
            sample_rate: stream.sample_rate(),
            block_len: stream.block_len(),
            queue_depth: self.shared.config.device_queue_depth,
        };
        let voice = self.shared.device.lock().create_voice(voice_config)?;
        let id = StreamId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));

        self.shared.channels.lock().push(StreamChannel {
            id,
            stream,
            voice,
            underruns: 0,
        });
        debug!(stream = %id, ?voice_config, "stream added");
        Ok(id)
    }

    /// Unregister a stream and close its voice. Returns whether it was registered.
    pub fn remove_stream(&self, id: StreamId) -> bool {
        let removed = {
            let mut channels = self.shared.channels.lock();
            let before = channels.len();
            channels.retain(|channel| channel.id != id);
            before != channels.len()
        };
        if removed {
            debug!(stream = %id, "stream removed");
        }
        removed
    }

    /// Run one service pass on the calling thread. Returns the number of
    /// blocks handed to the device.
    pub fn service(&self) -> usize {
        self.shared.service()
    }

    /// Start the background service thread. No-op if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let shared = Arc::clone(&self.shared);

        let handle = thread::Builder::new()
            .name("revmix-backend".into())
            .spawn(move || {
                debug!("backend service thread started");
                loop {
                    match stop_rx.recv_timeout(shared.service_interval()) {
                        Err(RecvTimeoutError::Timeout) => {
                            let submitted = shared.service();
                            trace!(submitted, "service tick");
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("backend service thread stopped");
            })
            .map_err(Error::ThreadSpawn)?;

        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    /// Stop and join the background service thread.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Underruns seen on one stream's voice.
    pub fn underruns(&self, id: StreamId) -> Option<u64> {
        self.shared
            .channels
            .lock()
            .iter()
            .find(|channel| channel.id == id)
            .map(|channel| channel.underruns)
    }

    pub fn stream_count(&self) -> usize {
        self.shared.channels.lock().len()
    }

    pub fn metrics(&self) -> BackendMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn config(&self) -> &BackendConfig {
        &self.shared.config
    }

    pub fn device_name(&self) -> String {
        self.shared.device.lock().name().to_string()
    }
}

impl<D: AudioDevice> Drop for PlaybackBackend<D> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}

/// Builder for [`PlaybackBackend`].
pub struct PlaybackBackendBuilder<D> {
    device: D,
    config: BackendConfig,
}

impl<D: AudioDevice + 'static> PlaybackBackendBuilder<D> {
    pub fn config(mut self, config: BackendConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 3
    pub fn device_queue_depth(mut self, depth: usize) -> Self {
        self.config.device_queue_depth = depth;
        self
    }

    /// Default: 3.0
    pub fn service_factor(mut self, factor: f64) -> Self {
        self.config.service_factor = factor;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = Some(interval);
        self
    }

    pub fn output_device(mut self, index: usize) -> Self {
        self.config.output_device = Some(index);
        self
    }

    pub fn build(self) -> Result<PlaybackBackend<D>> {
        PlaybackBackend::new(self.device, self.config)
    }
}

#[cfg(feature = "cpal")]
impl PlaybackBackend<crate::cpal_device::CpalDevice> {
    /// Backend on the cpal device named by `config.output_device`.
    pub fn open(config: BackendConfig) -> Result<Self> {
        let device = crate::cpal_device::CpalDevice::open(config.output_device)?;
        Self::new(device, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_device::VirtualDevice;
    use revmix_core::ManualClock;

    fn stream(block_len: usize) -> Arc<AudioStream> {
        Arc::new(
            AudioStream::builder()
                .sample_rate(48000)
                .block_len(block_len)
                .clock(Arc::new(ManualClock::new(0.0)))
                .background_fill(false)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_service_refills_processed_buffers() {
        let device = VirtualDevice::new();
        let clock = device.handle();
        let backend = PlaybackBackend::builder(device).build().unwrap();
        let id = backend.add_stream(stream(64)).unwrap();

        assert_eq!(backend.service(), 0);
        clock.advance(128);
        assert_eq!(backend.service(), 2);
        assert_eq!(backend.underruns(id), Some(0));
        assert_eq!(clock.queued(0), Some(3));
    }

    #[test]
    fn test_starved_voice_is_restarted_and_counted() {
        let device = VirtualDevice::new();
        let clock = device.handle();
        let backend = PlaybackBackend::builder(device)
            .device_queue_depth(2)
            .build()
            .unwrap();
        let id = backend.add_stream(stream(32)).unwrap();

        clock.advance(100);
        assert_eq!(clock.state(0), Some(VoiceState::Stopped));

        backend.service();
        assert_eq!(backend.underruns(id), Some(1));
        assert_eq!(backend.metrics().underruns, 1);
        assert_eq!(clock.state(0), Some(VoiceState::Playing));
    }

    #[test]
    fn test_remove_stream() {
        let backend = PlaybackBackend::builder(VirtualDevice::new())
            .build()
            .unwrap();
        let a = backend.add_stream(stream(32)).unwrap();
        let b = backend.add_stream(stream(32)).unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.stream_count(), 2);

        assert!(backend.remove_stream(a));
        assert!(!backend.remove_stream(a));
        assert_eq!(backend.underruns(a), None);
        assert_eq!(backend.stream_count(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = PlaybackBackend::builder(VirtualDevice::new())
            .device_queue_depth(0)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_background_thread_starts_and_stops() {
        let mut backend = PlaybackBackend::builder(VirtualDevice::new())
            .poll_interval(Duration::from_millis(1))
            .build()
            .unwrap();
        backend.add_stream(stream(32)).unwrap();

        backend.start().unwrap();
        assert!(backend.is_running());

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while backend.metrics().service_ticks == 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        backend.stop();
        assert!(!backend.is_running());
        assert!(backend.metrics().service_ticks > 0);
    }
}
