//! Real-time event mixing for revmix.
//!
//! Turns independently scheduled sound events into a gap-free stream of
//! `i16` blocks. The pieces, leaves first:
//!
//! - [`SampleProducer`]: anything that can render `f32` samples on demand.
//! - [`PlaybackEvent`]: a producer scheduled at a stream time with gain, pitch
//!   and a target insert.
//! - [`BufferPool`]: fixed `i16` blocks cycled between an input and an output FIFO.
//! - [`Mixer`]: renders events into blocks along a timeline that runs ahead of
//!   the wall clock, with late-event dropping and overrun recovery.
//! - [`AudioStream`]: mixer plus pool behind one lock, filled by a background
//!   thread and drained through [`AudioStream::next_buffer`].

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod insert;
pub mod lockfree;
pub mod metrics;
pub mod mixer;
pub mod pool;
pub mod producer;
pub mod stream;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StreamConfig;
pub use error::{Error, Result};
pub use event::PlaybackEvent;
pub use filter::{AudioFilter, Biquad, ButterworthLowpass, LowPassFilter};
pub use insert::InsertId;
pub use lockfree::{AtomicDouble, AtomicFlag, AtomicFloat};
pub use metrics::{StreamMetrics, StreamMetricsSnapshot};
pub use mixer::{BlockReport, Mixer};
pub use pool::{quantize, BufferPool, PoolOccupancy, PoolSlot};
pub use producer::{shared, ProducerHandle, SampleProducer, SharedProducer};
pub use stream::{AudioStream, AudioStreamBuilder, PlaybackBuffer};
