//! Deterministic in-process device.
//!
//! Nothing plays on its own: time moves only when [`VirtualDeviceHandle::advance`]
//! is called, which makes underruns and queue behaviour reproducible in tests
//! and lets headless tools render a backend's output to memory.

use crate::device::{AudioDevice, DeviceVoice, VoiceConfig, VoiceQueue, VoiceState};
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

struct VirtualVoiceInner {
    queue: VoiceQueue,
    /// Everything the voice has output, silence while stopped included
    played: Vec<i16>,
    released: bool,
}

type SharedVoice = Arc<Mutex<VirtualVoiceInner>>;

pub struct VirtualDevice {
    name: String,
    voices: Arc<Mutex<Vec<SharedVoice>>>,
}

impl VirtualDevice {
    pub fn new() -> Self {
        Self::named("virtual")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            voices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle for driving the device after it has been moved into a backend.
    pub fn handle(&self) -> VirtualDeviceHandle {
        VirtualDeviceHandle {
            voices: Arc::clone(&self.voices),
        }
    }
}

impl Default for VirtualDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice for VirtualDevice {
    type Voice = VirtualVoice;

    fn name(&self) -> &str {
        &self.name
    }

    fn create_voice(&mut self, config: VoiceConfig) -> Result<VirtualVoice> {
        let inner = Arc::new(Mutex::new(VirtualVoiceInner {
            queue: VoiceQueue::primed(config),
            played: Vec::new(),
            released: false,
        }));
        self.voices.lock().push(Arc::clone(&inner));
        Ok(VirtualVoice { inner })
    }
}

pub struct VirtualVoice {
    inner: SharedVoice,
}

impl DeviceVoice for VirtualVoice {
    fn processed(&mut self) -> usize {
        self.inner.lock().queue.processed_len()
    }

    fn requeue(&mut self, samples: &[i16]) -> Result<()> {
        self.inner.lock().queue.requeue(samples)
    }

    fn state(&self) -> VoiceState {
        self.inner.lock().queue.state()
    }

    fn play(&mut self) -> Result<()> {
        self.inner.lock().queue.play();
        Ok(())
    }
}

impl Drop for VirtualVoice {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        inner.queue.stop();
        inner.released = true;
    }
}

/// Clock and inspection handle for a [`VirtualDevice`]. Voices are indexed in
/// creation order.
#[derive(Clone)]
pub struct VirtualDeviceHandle {
    voices: Arc<Mutex<Vec<SharedVoice>>>,
}

impl VirtualDeviceHandle {
    /// Play `samples` samples on every live voice.
    pub fn advance(&self, samples: usize) {
        for voice in self.voices.lock().iter() {
            let mut inner = voice.lock();
            if inner.released {
                continue;
            }
            for _ in 0..samples {
                let sample = inner.queue.next_sample().unwrap_or(0);
                inner.played.push(sample);
            }
        }
    }

    pub fn voice_count(&self) -> usize {
        self.voices.lock().len()
    }

    pub fn state(&self, voice: usize) -> Option<VoiceState> {
        self.voice(voice).map(|v| v.lock().queue.state())
    }

    pub fn queued(&self, voice: usize) -> Option<usize> {
        self.voice(voice).map(|v| v.lock().queue.queued_len())
    }

    /// Copy of everything `voice` has output so far.
    pub fn played(&self, voice: usize) -> Option<Vec<i16>> {
        self.voice(voice).map(|v| v.lock().played.clone())
    }

    pub fn is_released(&self, voice: usize) -> Option<bool> {
        self.voice(voice).map(|v| v.lock().released)
    }

    fn voice(&self, voice: usize) -> Option<SharedVoice> {
        self.voices.lock().get(voice).cloned()
    }
}
