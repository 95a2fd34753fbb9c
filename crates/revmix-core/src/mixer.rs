//! The block mixer.
//!
//! [`Mixer`] owns the inserts and their events and renders one pool block at
//! a time along a timeline cursor (`buffer_time`). The cursor runs ahead of
//! the wall clock by the compensation delay so that events submitted slightly
//! in the past still land inside a block that has not been filled yet.
//!
//! Per block:
//!
//! 1. Pending events whose start time falls inside the block start at a
//!    sample-accurate offset. Pending events that fell behind the cursor start
//!    at offset 0 when within the late tolerance (static producers always do)
//!    and are dropped otherwise.
//! 2. Started events render across the whole block.
//! 3. Expired and dropped events are removed.
//! 4. If the wall clock has run further ahead of the cursor than the overrun
//!    threshold allows, every non-static event is evicted and the cursor is
//!    pulled forward to `now - compensation_delay`.
//! 5. The mix is quantized to `i16` and the cursor advances by one block.
//!
//! The mixer does no locking or allocation; [`AudioStream`](crate::AudioStream)
//! wraps it in the stream mutex together with the buffer pool.

use crate::config::StreamConfig;
use crate::event::{EventState, PlaybackEvent};
use crate::filter::AudioFilter;
use crate::insert::{Insert, InsertId};
use crate::pool::quantize;
use crate::{Error, Result};
use tracing::{trace, warn};

/// Lifecycle counts from one [`Mixer::fill_block`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReport {
    /// Events that began rendering in this block
    pub started: usize,
    /// Events removed because their producer expired
    pub retired: usize,
    /// Events dropped for starting too late
    pub late_dropped: usize,
    /// Events evicted by overrun recovery
    pub evicted: usize,
    /// Whether overrun recovery moved the cursor
    pub resynced: bool,
}

#[derive(Debug)]
pub struct Mixer {
    sample_rate: f64,
    block_len: usize,
    block_duration: f64,
    compensation_delay: f64,
    /// Overrun threshold in seconds
    overrun_limit: f64,
    /// Late tolerance in seconds
    late_limit: f64,
    inserts: Vec<Insert>,
    next_insert: u32,
    work: Vec<f32>,
    buffer_time: f64,
}

impl Mixer {
    /// Mixer with its cursor at `-compensation_delay`.
    pub fn new(config: &StreamConfig) -> Result<Self> {
        config.validate()?;

        let block_duration = config.block_duration();
        let compensation_delay = config.compensation_delay();

        Ok(Self {
            sample_rate: config.sample_rate as f64,
            block_len: config.block_len,
            block_duration,
            compensation_delay,
            overrun_limit: config.overrun_threshold * compensation_delay,
            late_limit: config.late_tolerance * block_duration,
            inserts: vec![Insert::new(InsertId::MAIN, config.block_len)],
            next_insert: 1,
            work: vec![0.0; config.block_len],
            buffer_time: -compensation_delay,
        })
    }

    /// Start the cursor somewhere other than `-compensation_delay`.
    pub fn with_buffer_time(mut self, buffer_time: f64) -> Self {
        self.buffer_time = buffer_time;
        self
    }

    /// Timeline position of the next block to fill.
    #[inline]
    pub fn buffer_time(&self) -> f64 {
        self.buffer_time
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    pub fn block_duration(&self) -> f64 {
        self.block_duration
    }

    pub fn compensation_delay(&self) -> f64 {
        self.compensation_delay
    }

    /// Put the cursor back at `-compensation_delay`. Events are kept.
    pub fn reset_timeline(&mut self) {
        self.buffer_time = -self.compensation_delay;
    }

    /// Queue an event on its insert, or on the main insert if it names none
    /// that exists.
    pub fn submit(&mut self, mut event: PlaybackEvent) {
        let index = match self.insert_index(event.insert) {
            Some(index) => index,
            None => {
                trace!(insert = %event.insert, "unknown insert, routing to main");
                event.insert = InsertId::MAIN;
                0
            }
        };
        self.inserts[index].events.push(event);
    }

    /// [`submit`](Self::submit) with the start time set to `start_time`.
    pub fn submit_at(&mut self, event: PlaybackEvent, start_time: f64) {
        self.submit(event.at(start_time));
    }

    pub fn new_insert(&mut self) -> InsertId {
        let id = InsertId(self.next_insert);
        self.next_insert += 1;
        self.inserts.push(Insert::new(id, self.block_len));
        id
    }

    pub fn set_insert_gain(&mut self, id: InsertId, gain: f32) -> Result<()> {
        let index = self.insert_index(id).ok_or(Error::UnknownInsert(id))?;
        self.inserts[index].gain = gain;
        Ok(())
    }

    pub fn insert_gain(&self, id: InsertId) -> Option<f32> {
        self.insert_index(id).map(|index| self.inserts[index].gain)
    }

    /// Append a filter to the end of an insert's chain.
    pub fn add_filter<F: AudioFilter + 'static>(&mut self, id: InsertId, filter: F) -> Result<()> {
        let index = self.insert_index(id).ok_or(Error::UnknownInsert(id))?;
        self.inserts[index].filters.push(Box::new(filter));
        Ok(())
    }

    /// Remove an insert and drop its events. Returns how many events were dropped.
    pub fn remove_insert(&mut self, id: InsertId) -> Result<usize> {
        if id.is_main() {
            return Err(Error::MainInsertRemoval);
        }
        let index = self.insert_index(id).ok_or(Error::UnknownInsert(id))?;
        let insert = self.inserts.remove(index);
        Ok(insert.events.len())
    }

    pub fn has_insert(&self, id: InsertId) -> bool {
        self.insert_index(id).is_some()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.len()
    }

    /// Live events across all inserts.
    pub fn event_count(&self) -> usize {
        self.inserts.iter().map(|insert| insert.events.len()).sum()
    }

    fn insert_index(&self, id: InsertId) -> Option<usize> {
        self.inserts.iter().position(|insert| insert.id == id)
    }

    /// Render the block at the cursor into `out` and advance the cursor.
    ///
    /// `now` is the wall-clock stream time used for overrun detection.
    pub fn fill_block(&mut self, now: f64, out: &mut [i16]) -> BlockReport {
        let mut report = BlockReport::default();
        let block_start = self.buffer_time;
        let block_end = block_start + self.block_duration;
        let sample_rate = self.sample_rate;
        let late_limit = self.late_limit;

        self.work.fill(0.0);

        for insert in &mut self.inserts {
            insert.clear_bus();
            let (events, bus) = insert.events_and_bus();

            for event in events.iter_mut() {
                match event.state {
                    EventState::Started => {
                        event.render(bus);
                    }
                    EventState::Pending => {
                        if event.start_time >= block_end {
                            continue;
                        }

                        let offset = if event.start_time >= block_start {
                            ((event.start_time - block_start) * sample_rate).round() as usize
                        } else if event.producer.is_static()
                            || block_start - event.start_time <= late_limit
                        {
                            0
                        } else {
                            trace!(
                                start = event.start_time,
                                buffer_time = block_start,
                                "dropping late event"
                            );
                            event.state = EventState::Missed;
                            continue;
                        };

                        event.state = EventState::Started;
                        report.started += 1;
                        let offset = offset.min(bus.len());
                        event.render(&mut bus[offset..]);
                    }
                    EventState::Missed => {}
                }
            }

            events.retain(|event| {
                if event.state == EventState::Missed {
                    report.late_dropped += 1;
                    false
                } else if event.producer.has_expired() {
                    report.retired += 1;
                    false
                } else {
                    true
                }
            });

            insert.sum_into(&mut self.work);
        }

        if now - block_start > self.overrun_limit {
            for insert in &mut self.inserts {
                let before = insert.events.len();
                insert.events.retain(|event| event.producer.is_static());
                report.evicted += before - insert.events.len();
            }
            self.buffer_time = now - self.compensation_delay;
            report.resynced = true;
            warn!(
                lag = now - block_start,
                evicted = report.evicted,
                "mixer overrun, resyncing timeline"
            );
        }

        quantize(&self.work, out);
        self.buffer_time += self.block_duration;

        report
    }
}
