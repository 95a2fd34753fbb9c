//! Backend health counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct BackendMetrics {
    /// Voices found starved and restarted
    underruns: AtomicU64,
    /// Mixer blocks copied to device buffers
    buffers_submitted: AtomicU64,
    /// Device buffers left unfilled because a stream had no block to give
    missed_buffers: AtomicU64,
    /// Service passes run
    service_ticks: AtomicU64,
}

impl BackendMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_submitted(&self, buffers: usize) {
        self.buffers_submitted
            .fetch_add(buffers as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_missed(&self) {
        self.missed_buffers.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tick(&self) {
        self.service_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> BackendMetricsSnapshot {
        BackendMetricsSnapshot {
            underruns: self.underruns.load(Ordering::Relaxed),
            buffers_submitted: self.buffers_submitted.load(Ordering::Relaxed),
            missed_buffers: self.missed_buffers.load(Ordering::Relaxed),
            service_ticks: self.service_ticks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`BackendMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendMetricsSnapshot {
    pub underruns: u64,
    pub buffers_submitted: u64,
    pub missed_buffers: u64,
    pub service_ticks: u64,
}
