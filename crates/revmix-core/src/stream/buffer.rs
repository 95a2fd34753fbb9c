//! Consumer-side guard over a filled pool slot.

use super::StreamShared;
use crate::pool::PoolSlot;
use std::fmt;
use std::ops::Deref;

/// A filled block checked out of the pool.
///
/// Dereferences to the block's samples. Dropping it returns the slot to the
/// input queue and wakes the fill thread.
pub struct PlaybackBuffer<'a> {
    slot: Option<PoolSlot>,
    shared: &'a StreamShared,
}

impl<'a> PlaybackBuffer<'a> {
    pub(crate) fn new(slot: PoolSlot, shared: &'a StreamShared) -> Self {
        Self {
            slot: Some(slot),
            shared,
        }
    }

    /// Pool slot index, for diagnostics.
    pub fn slot_id(&self) -> usize {
        self.slot.as_ref().map_or(0, PoolSlot::id)
    }
}

impl Deref for PlaybackBuffer<'_> {
    type Target = [i16];

    fn deref(&self) -> &[i16] {
        match &self.slot {
            Some(slot) => slot.samples(),
            None => &[],
        }
    }
}

impl Drop for PlaybackBuffer<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.shared.state.lock().pool.recycle(slot);
            self.shared.wake.notify_one();
        }
    }
}

impl fmt::Debug for PlaybackBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackBuffer")
            .field("slot", &self.slot_id())
            .field("len", &self.len())
            .finish()
    }
}
