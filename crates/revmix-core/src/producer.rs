//! The sample producer contract.
//!
//! A producer renders blocks of `f32` samples on demand and reports when it
//! has nothing more to contribute. The mixer drives producers through
//! [`ProducerHandle`], which fixes one ownership model per event:
//!
//! - [`ProducerHandle::Owned`]: the mixer owns the producer and drops it as soon
//!   as the event retires (one-shot sounds like kicks and clips).
//! - [`ProducerHandle::Shared`]: the producer is reference-counted and outlives
//!   the event; the mixer only releases its reference (ambient or externally
//!   driven sounds).

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Something that can render audio into a mix buffer.
///
/// Both render methods take slices that may be shorter than a full block
/// (events starting mid-block). Implementations clip to their own remaining
/// length, return the number of samples actually written, and flip their
/// expired flag once they run out. Once [`has_expired`](Self::has_expired)
/// returns `true` the mixer never renders the producer again.
pub trait SampleProducer: Send {
    /// Overwrite `out[..n]` with fresh samples and return `n`.
    fn produce(&mut self, out: &mut [f32]) -> usize;

    /// Add `gain`-scaled samples onto `out[..n]` and return `n`.
    fn accumulate(&mut self, out: &mut [f32], gain: f32) -> usize;

    /// Total length in seconds. `0.0` marks an indefinite (static) producer.
    fn duration(&self) -> f64;

    fn has_expired(&self) -> bool;

    /// Playback-rate multiplier forwarded from the event before each render.
    fn set_pitch(&mut self, _pitch: f32) {}

    /// Static producers survive overrun eviction and have no notion of lateness.
    fn is_static(&self) -> bool {
        self.duration() == 0.0
    }
}

/// Reference-counted producer, shared between the mixer and its owner.
pub type SharedProducer = Arc<Mutex<dyn SampleProducer>>;

/// Wrap a producer for shared ownership.
///
/// Keep a clone of the returned handle to drive or expire the producer while
/// the mixer renders it.
pub fn shared<P: SampleProducer + 'static>(producer: P) -> Arc<Mutex<P>> {
    Arc::new(Mutex::new(producer))
}

/// How an event holds its producer.
pub enum ProducerHandle {
    Owned(Box<dyn SampleProducer>),
    Shared(SharedProducer),
}

impl ProducerHandle {
    pub fn owned<P: SampleProducer + 'static>(producer: P) -> Self {
        Self::Owned(Box::new(producer))
    }

    pub fn shared<P: SampleProducer + 'static>(producer: &Arc<Mutex<P>>) -> Self {
        let producer: SharedProducer = producer.clone();
        Self::Shared(producer)
    }

    /// Render onto `out`, skipping producers that have already expired.
    pub(crate) fn accumulate(&mut self, out: &mut [f32], gain: f32, pitch: f32) -> usize {
        match self {
            Self::Owned(producer) => render(producer.as_mut(), out, gain, pitch),
            Self::Shared(producer) => render(&mut *producer.lock(), out, gain, pitch),
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            Self::Owned(producer) => producer.duration(),
            Self::Shared(producer) => producer.lock().duration(),
        }
    }

    pub fn has_expired(&self) -> bool {
        match self {
            Self::Owned(producer) => producer.has_expired(),
            Self::Shared(producer) => producer.lock().has_expired(),
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            Self::Owned(producer) => producer.is_static(),
            Self::Shared(producer) => producer.lock().is_static(),
        }
    }
}

#[inline]
fn render(producer: &mut dyn SampleProducer, out: &mut [f32], gain: f32, pitch: f32) -> usize {
    if out.is_empty() || producer.has_expired() {
        return 0;
    }
    producer.set_pitch(pitch);
    producer.accumulate(out, gain)
}

impl<P: SampleProducer + 'static> From<Box<P>> for ProducerHandle {
    fn from(producer: Box<P>) -> Self {
        Self::Owned(producer)
    }
}

impl From<SharedProducer> for ProducerHandle {
    fn from(producer: SharedProducer) -> Self {
        Self::Shared(producer)
    }
}

impl fmt::Debug for ProducerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owned(_) => f.write_str("ProducerHandle::Owned"),
            Self::Shared(_) => f.write_str("ProducerHandle::Shared"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits a constant for a fixed number of samples.
    struct Constant {
        value: f32,
        remaining: usize,
        pitch: f32,
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
            1.0
        }

        fn has_expired(&self) -> bool {
            self.remaining == 0
        }

        fn set_pitch(&mut self, pitch: f32) {
            self.pitch = pitch;
        }
    }

    fn constant(remaining: usize) -> Constant {
        Constant {
            value: 0.5,
            remaining,
            pitch: 1.0,
        }
    }

    #[test]
    fn test_owned_render_clips_to_remaining() {
        let mut handle = ProducerHandle::owned(constant(3));
        let mut out = [0.0f32; 8];
        assert_eq!(handle.accumulate(&mut out, 2.0, 1.0), 3);
        assert_eq!(&out[..4], &[1.0, 1.0, 1.0, 0.0]);
        assert!(handle.has_expired());
    }

    #[test]
    fn test_expired_producer_is_never_rendered() {
        let mut handle = ProducerHandle::owned(constant(0));
        let mut out = [0.0f32; 4];
        assert_eq!(handle.accumulate(&mut out, 1.0, 1.0), 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_shared_handle_forwards_pitch() {
        let producer = shared(constant(16));
        let mut handle = ProducerHandle::shared(&producer);
        let mut out = [0.0f32; 4];
        handle.accumulate(&mut out, 1.0, 1.5);
        assert_eq!(producer.lock().pitch, 1.5);
        assert_eq!(producer.lock().remaining, 12);
        assert!(!handle.is_static());
    }
}
