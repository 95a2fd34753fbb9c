//! Stream health counters.
//!
//! Written by the fill path, read from any thread through [`StreamMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct StreamMetrics {
    /// Blocks rendered into pool slots
    blocks_filled: AtomicU64,
    /// Fills run synchronously because a consumer found the output queue empty
    forced_fills: AtomicU64,
    /// Events dropped for starting too late
    late_drops: AtomicU64,
    /// Events retired after their producer expired
    retired_events: AtomicU64,
    /// Events evicted by overrun recovery
    evicted_events: AtomicU64,
    /// Overrun recoveries
    overrun_resyncs: AtomicU64,
    /// Events accepted by play/play_at/play_in
    events_submitted: AtomicU64,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_block(&self) {
        self.blocks_filled.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_forced_fill(&self) {
        self.forced_fills.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_submit(&self) {
        self.events_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold one block's lifecycle counts into the totals.
    pub fn record_report(&self, report: &crate::mixer::BlockReport) {
        if report.late_dropped > 0 {
            self.late_drops
                .fetch_add(report.late_dropped as u64, Ordering::Relaxed);
        }
        if report.retired > 0 {
            self.retired_events
                .fetch_add(report.retired as u64, Ordering::Relaxed);
        }
        if report.evicted > 0 {
            self.evicted_events
                .fetch_add(report.evicted as u64, Ordering::Relaxed);
        }
        if report.resynced {
            self.overrun_resyncs.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count events released outside a fill pass (insert removal).
    #[inline]
    pub fn record_retired(&self, count: usize) {
        self.retired_events
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StreamMetricsSnapshot {
        StreamMetricsSnapshot {
            blocks_filled: self.blocks_filled.load(Ordering::Relaxed),
            forced_fills: self.forced_fills.load(Ordering::Relaxed),
            late_drops: self.late_drops.load(Ordering::Relaxed),
            retired_events: self.retired_events.load(Ordering::Relaxed),
            evicted_events: self.evicted_events.load(Ordering::Relaxed),
            overrun_resyncs: self.overrun_resyncs.load(Ordering::Relaxed),
            events_submitted: self.events_submitted.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.blocks_filled.store(0, Ordering::Relaxed);
        self.forced_fills.store(0, Ordering::Relaxed);
        self.late_drops.store(0, Ordering::Relaxed);
        self.retired_events.store(0, Ordering::Relaxed);
        self.evicted_events.store(0, Ordering::Relaxed);
        self.overrun_resyncs.store(0, Ordering::Relaxed);
        self.events_submitted.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`StreamMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamMetricsSnapshot {
    pub blocks_filled: u64,
    pub forced_fills: u64,
    pub late_drops: u64,
    pub retired_events: u64,
    pub evicted_events: u64,
    pub overrun_resyncs: u64,
    pub events_submitted: u64,
}
