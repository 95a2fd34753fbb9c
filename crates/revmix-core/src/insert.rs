//! Inserts: mix buses inside a stream.
//!
//! Each insert collects the events routed to it into its own bus, runs its
//! filter chain over the bus, then sums it into the stream's work buffer at
//! the insert gain. Insert 0 is the main insert and always exists.

use crate::event::PlaybackEvent;
use crate::filter::AudioFilter;
use std::fmt;

/// Identifies an insert within one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InsertId(pub(crate) u32);

impl InsertId {
    /// The main insert. Cannot be removed.
    pub const MAIN: InsertId = InsertId(0);

    pub fn index(self) -> u32 {
        self.0
    }

    pub fn is_main(self) -> bool {
        self == Self::MAIN
    }
}

impl Default for InsertId {
    fn default() -> Self {
        Self::MAIN
    }
}

impl fmt::Display for InsertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insert#{}", self.0)
    }
}

pub(crate) struct Insert {
    pub(crate) id: InsertId,
    pub(crate) gain: f32,
    pub(crate) filters: Vec<Box<dyn AudioFilter>>,
    pub(crate) events: Vec<PlaybackEvent>,
    bus: Vec<f32>,
    scratch: Vec<f32>,
}

impl Insert {
    pub(crate) fn new(id: InsertId, block_len: usize) -> Self {
        Self {
            id,
            gain: 1.0,
            filters: Vec::new(),
            events: Vec::with_capacity(32),
            bus: vec![0.0; block_len],
            scratch: vec![0.0; block_len],
        }
    }

    /// Zeroed bus for this block.
    #[inline]
    pub(crate) fn clear_bus(&mut self) -> &mut [f32] {
        self.bus.fill(0.0);
        &mut self.bus
    }

    /// Split borrow used by the mixer: the event list plus the bus to render into.
    #[inline]
    pub(crate) fn events_and_bus(&mut self) -> (&mut Vec<PlaybackEvent>, &mut [f32]) {
        (&mut self.events, &mut self.bus)
    }

    /// Run the filter chain over the bus, then add `bus * gain` to `work`.
    pub(crate) fn sum_into(&mut self, work: &mut [f32]) {
        for filter in &mut self.filters {
            filter.process(&self.bus, &mut self.scratch);
            std::mem::swap(&mut self.bus, &mut self.scratch);
        }

        let gain = self.gain;
        for (out, &sample) in work.iter_mut().zip(&self.bus) {
            *out += sample * gain;
        }
    }
}

impl fmt::Debug for Insert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Insert")
            .field("id", &self.id)
            .field("gain", &self.gain)
            .field("filters", &self.filters.len())
            .field("events", &self.events.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Halve;

    impl AudioFilter for Halve {
        fn process(&mut self, input: &[f32], output: &mut [f32]) {
            for (o, i) in output.iter_mut().zip(input) {
                *o = i * 0.5;
            }
        }
    }

    #[test]
    fn test_insert_id_display() {
        assert_eq!(InsertId::MAIN.to_string(), "insert#0");
        assert!(InsertId::default().is_main());
        assert!(!InsertId(3).is_main());
    }

    #[test]
    fn test_filter_chain_and_gain() {
        let mut insert = Insert::new(InsertId(1), 4);
        insert.gain = 2.0;
        insert.filters.push(Box::new(Halve));
        insert.filters.push(Box::new(Halve));
        insert.clear_bus().fill(1.0);

        let mut work = [0.5f32; 4];
        insert.sum_into(&mut work);
        assert_eq!(work, [1.0; 4]);
    }
}
