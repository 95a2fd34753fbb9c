//! Playback events: one scheduled instance of a producer.

use crate::insert::InsertId;
use crate::producer::{ProducerHandle, SampleProducer, SharedProducer};
use parking_lot::Mutex;
use std::sync::Arc;

/// Where an event is in its lifecycle. Only the mixer moves it forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EventState {
    #[default]
    Pending,
    Started,
    /// Behind the render cursor by more than the late tolerance; retired on
    /// the next sweep without ever being rendered.
    Missed,
}

/// A producer scheduled on a stream with its own gain, pitch and start time.
///
/// # Example
///
/// ```ignore
/// let kick = PlaybackEvent::new(ProceduralKick::new(KickParams::default(), 44100))
///     .gain(0.8)
///     .pitch(1.2);
/// stream.play_in(kick, 0.05);
/// ```
#[derive(Debug)]
pub struct PlaybackEvent {
    pub(crate) producer: ProducerHandle,
    pub(crate) gain: f32,
    pub(crate) pitch: f32,
    pub(crate) insert: InsertId,
    pub(crate) start_time: f64,
    pub(crate) state: EventState,
}

impl PlaybackEvent {
    /// Event that exclusively owns `producer`.
    pub fn new<P: SampleProducer + 'static>(producer: P) -> Self {
        Self::from_handle(ProducerHandle::owned(producer))
    }

    /// Event that shares `producer` with its caller.
    pub fn shared<P: SampleProducer + 'static>(producer: &Arc<Mutex<P>>) -> Self {
        Self::from_handle(ProducerHandle::shared(producer))
    }

    pub fn from_shared(producer: SharedProducer) -> Self {
        Self::from_handle(ProducerHandle::Shared(producer))
    }

    pub fn from_handle(producer: ProducerHandle) -> Self {
        Self {
            producer,
            gain: 1.0,
            pitch: 1.0,
            insert: InsertId::MAIN,
            start_time: 0.0,
            state: EventState::Pending,
        }
    }

    /// Default: 1.0
    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Default: 1.0
    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Route the event to an insert. Unknown inserts fall back to the main one.
    pub fn insert(mut self, insert: InsertId) -> Self {
        self.insert = insert;
        self
    }

    pub fn gain_value(&self) -> f32 {
        self.gain
    }

    pub fn pitch_value(&self) -> f32 {
        self.pitch
    }

    pub fn insert_id(&self) -> InsertId {
        self.insert
    }

    /// Absolute stream time this event starts at.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn has_started(&self) -> bool {
        self.state == EventState::Started
    }

    pub(crate) fn at(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self.state = EventState::Pending;
        self
    }

    #[inline]
    pub(crate) fn render(&mut self, out: &mut [f32]) -> usize {
        self.producer.accumulate(out, self.gain, self.pitch)
    }
}
