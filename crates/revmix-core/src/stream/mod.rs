//! Audio streams: a mixer and its buffer pool behind one lock.
//!
//! An [`AudioStream`] accepts [`PlaybackEvent`]s from any thread and hands
//! filled `i16` blocks to a consumer through [`AudioStream::next_buffer`].
//! Blocks are rendered ahead of time by a dedicated fill thread, or pulled on
//! demand when the stream is built without one.
//!
//! # Example
//!
//! ```
//! use revmix_core::{AudioStream, ManualClock};
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::new(0.0));
//! let stream = AudioStream::builder()
//!     .sample_rate(48000)
//!     .block_len(256)
//!     .clock(clock)
//!     .background_fill(false)
//!     .build()
//!     .unwrap();
//!
//! let buffer = stream.next_buffer().unwrap();
//! assert_eq!(buffer.len(), 256);
//! ```

mod buffer;
mod builder;
mod thread;

pub use buffer::PlaybackBuffer;
pub use builder::AudioStreamBuilder;

use crate::clock::Clock;
use crate::config::StreamConfig;
use crate::event::PlaybackEvent;
use crate::filter::AudioFilter;
use crate::insert::InsertId;
use crate::lockfree::{AtomicDouble, AtomicFlag};
use crate::metrics::{StreamMetrics, StreamMetricsSnapshot};
use crate::mixer::Mixer;
use crate::pool::{BufferPool, PoolOccupancy};
use crate::Result;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, trace};

/// Everything the stream lock protects.
pub(crate) struct StreamState {
    pub(crate) mixer: Mixer,
    pub(crate) pool: BufferPool,
}

pub(crate) struct StreamShared {
    pub(crate) state: Mutex<StreamState>,
    /// Signalled when a slot returns to the input queue or on shutdown
    pub(crate) wake: Condvar,
    pub(crate) shutdown: AtomicFlag,
    clock: Arc<dyn Clock>,
    /// Clock reading that stream time 0 corresponds to
    stream_start: AtomicDouble,
    pub(crate) metrics: StreamMetrics,
    pub(crate) config: StreamConfig,
}

impl StreamShared {
    #[inline]
    fn time(&self) -> f64 {
        self.clock.now() - self.stream_start.get()
    }

    /// Fill every slot in the input queue. Returns the number of blocks filled.
    pub(crate) fn fill_locked(&self, state: &mut StreamState) -> usize {
        let now = self.time();
        let mut filled = 0;

        while let Some(mut slot) = state.pool.take_input() {
            let report = state.mixer.fill_block(now, slot.samples_mut());
            state.pool.publish(slot);
            self.metrics.record_block();
            self.metrics.record_report(&report);
            filled += 1;
        }

        if filled > 0 {
            trace!(
                filled,
                buffer_time = state.mixer.buffer_time(),
                "fill pass"
            );
        }
        filled
    }
}

/// A stream of mixed `i16` blocks fed by scheduled playback events.
pub struct AudioStream {
    shared: Arc<StreamShared>,
    fill_thread: Option<JoinHandle<()>>,
}

impl AudioStream {
    pub fn builder() -> AudioStreamBuilder {
        AudioStreamBuilder::new()
    }

    /// Stream with a system clock and a background fill thread.
    pub fn new(config: StreamConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub(crate) fn from_parts(
        config: StreamConfig,
        clock: Arc<dyn Clock>,
        background_fill: bool,
    ) -> Result<Self> {
        let mixer = Mixer::new(&config)?;
        let pool = BufferPool::new(config.pool_size, config.block_len);
        let stream_start = clock.now();

        let shared = Arc::new(StreamShared {
            state: Mutex::new(StreamState { mixer, pool }),
            wake: Condvar::new(),
            shutdown: AtomicFlag::new(false),
            clock,
            stream_start: AtomicDouble::new(stream_start),
            metrics: StreamMetrics::new(),
            config,
        });

        let fill_thread = if background_fill {
            Some(thread::spawn_fill_thread(Arc::clone(&shared))?)
        } else {
            None
        };

        debug!(
            sample_rate = shared.config.sample_rate,
            block_len = shared.config.block_len,
            pool_size = shared.config.pool_size,
            background_fill,
            "audio stream created"
        );

        Ok(Self {
            shared,
            fill_thread,
        })
    }

    /// Start `event` now.
    pub fn play(&self, event: PlaybackEvent) {
        let now = self.time();
        self.play_at(event, now);
    }

    /// Start `event` at an absolute stream time in seconds.
    pub fn play_at(&self, event: PlaybackEvent, start_time: f64) {
        let event = event.at(start_time);
        self.shared.state.lock().mixer.submit(event);
        self.shared.metrics.record_submit();
    }

    /// Start `event` `delay` seconds from now.
    pub fn play_in(&self, event: PlaybackEvent, delay: f64) {
        let start = self.time() + delay;
        self.play_at(event, start);
    }

    /// Oldest filled block, as a guard that returns the slot to the pool on drop.
    ///
    /// Runs a synchronous fill pass first when no filled block is waiting.
    /// Returns `None` only when every slot is already checked out.
    pub fn next_buffer(&self) -> Option<PlaybackBuffer<'_>> {
        let mut state = self.shared.state.lock();
        if state.pool.output_len() == 0 && self.shared.fill_locked(&mut state) > 0 {
            self.shared.metrics.record_forced_fill();
        }
        let slot = state.pool.take_output()?;
        Some(PlaybackBuffer::new(slot, &self.shared))
    }

    pub fn has_next_ready(&self) -> bool {
        self.shared.state.lock().pool.output_len() > 0
    }

    /// Run one fill pass on the calling thread. Returns the number of blocks filled.
    pub fn fill(&self) -> usize {
        let mut state = self.shared.state.lock();
        self.shared.fill_locked(&mut state)
    }

    /// Elapsed stream time in seconds.
    pub fn time(&self) -> f64 {
        self.shared.time()
    }

    /// Re-base stream time to now and rewind the mixer cursor.
    ///
    /// Filled blocks that have not been consumed are discarded back to the
    /// input queue. Events stay queued and keep their absolute start times.
    pub fn restart(&self) {
        let mut state = self.shared.state.lock();
        self.shared.stream_start.set(self.shared.clock.now());
        state.mixer.reset_timeline();
        let discarded = state.pool.reclaim_output();
        self.shared.wake.notify_one();
        debug!(discarded, "audio stream restarted");
    }

    pub fn event_count(&self) -> usize {
        self.shared.state.lock().mixer.event_count()
    }

    /// Timeline position of the next block the mixer will fill.
    pub fn buffer_time(&self) -> f64 {
        self.shared.state.lock().mixer.buffer_time()
    }

    pub fn pool_occupancy(&self) -> PoolOccupancy {
        self.shared.state.lock().pool.occupancy()
    }

    pub fn new_insert(&self) -> InsertId {
        self.shared.state.lock().mixer.new_insert()
    }

    pub fn set_insert_gain(&self, id: InsertId, gain: f32) -> Result<()> {
        self.shared.state.lock().mixer.set_insert_gain(id, gain)
    }

    pub fn add_filter<F: AudioFilter + 'static>(&self, id: InsertId, filter: F) -> Result<()> {
        self.shared.state.lock().mixer.add_filter(id, filter)
    }

    /// Remove an insert. Its events are released without further rendering.
    pub fn remove_insert(&self, id: InsertId) -> Result<()> {
        let dropped = self.shared.state.lock().mixer.remove_insert(id)?;
        self.shared.metrics.record_retired(dropped);
        debug!(insert = %id, dropped, "insert removed");
        Ok(())
    }

    pub fn metrics(&self) -> StreamMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.shared.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.shared.config.sample_rate
    }

    pub fn block_len(&self) -> usize {
        self.shared.config.block_len
    }

    pub fn has_fill_thread(&self) -> bool {
        self.fill_thread.is_some()
    }
}

impl Drop for AudioStream {
    fn drop(&mut self) {
        {
            let _state = self.shared.state.lock();
            self.shared.shutdown.set(true);
            self.shared.wake.notify_all();
        }
        if let Some(handle) = self.fill_thread.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream")
            .field("config", &self.shared.config)
            .field("fill_thread", &self.fill_thread.is_some())
            .finish()
    }
}
