//! Device sink contract.
//!
//! A device hands out voices. Each voice owns a small queue of `i16` buffers
//! that the hardware (or a simulation of it) plays in order. The backend
//! reclaims buffers the voice has finished with, refills them and queues them
//! again. A voice that runs out of queued audio stops by itself and has to be
//! started again.

use crate::Result;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Playing,
    /// Not started yet, or starved of queued audio
    Stopped,
}

/// Shape of a voice's buffer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceConfig {
    pub sample_rate: u32,
    /// Samples per device buffer
    pub block_len: usize,
    /// Buffers in flight
    pub queue_depth: usize,
}

pub trait DeviceVoice: Send {
    /// Buffers played and waiting to be reclaimed.
    fn processed(&mut self) -> usize;

    /// Reclaim the oldest processed buffer, overwrite it with `samples` and
    /// queue it behind the others.
    fn requeue(&mut self, samples: &[i16]) -> Result<()>;

    fn state(&self) -> VoiceState;

    /// Start (or restart) playback of whatever is queued.
    fn play(&mut self) -> Result<()>;
}

pub trait AudioDevice: Send {
    type Voice: DeviceVoice + 'static;

    fn name(&self) -> &str;

    /// Open a voice with `config.queue_depth` silent buffers queued and
    /// playback already started.
    fn create_voice(&mut self, config: VoiceConfig) -> Result<Self::Voice>;
}

/// Buffer queue behind one voice, shared by the device implementations.
#[derive(Debug)]
pub(crate) struct VoiceQueue {
    queued: VecDeque<Box<[i16]>>,
    processed: VecDeque<Box<[i16]>>,
    cursor: usize,
    state: VoiceState,
}

impl VoiceQueue {
    /// Queue primed with silence and already playing.
    pub(crate) fn primed(config: VoiceConfig) -> Self {
        let depth = config.queue_depth.max(1);
        let mut queued = VecDeque::with_capacity(depth);
        queued.extend((0..depth).map(|_| vec![0i16; config.block_len].into_boxed_slice()));

        Self {
            queued,
            processed: VecDeque::with_capacity(depth),
            cursor: 0,
            state: VoiceState::Playing,
        }
    }

    /// Next sample the device should output, or `None` when stopped.
    ///
    /// Finishing a buffer moves it to the processed list; finishing the last
    /// queued buffer stops the voice.
    #[inline]
    pub(crate) fn next_sample(&mut self) -> Option<i16> {
        if self.state != VoiceState::Playing {
            return None;
        }

        let Some(front) = self.queued.front() else {
            self.state = VoiceState::Stopped;
            return None;
        };
        let sample = front.get(self.cursor).copied().unwrap_or(0);
        self.cursor += 1;

        if self.cursor >= front.len() {
            self.cursor = 0;
            if let Some(done) = self.queued.pop_front() {
                self.processed.push_back(done);
            }
            if self.queued.is_empty() {
                self.state = VoiceState::Stopped;
            }
        }
        Some(sample)
    }

    pub(crate) fn processed_len(&self) -> usize {
        self.processed.len()
    }

    pub(crate) fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub(crate) fn requeue(&mut self, samples: &[i16]) -> Result<()> {
        let mut buffer = self
            .processed
            .pop_front()
            .ok_or(crate::Error::NoProcessedBuffer)?;
        let n = samples.len().min(buffer.len());
        buffer[..n].copy_from_slice(&samples[..n]);
        buffer[n..].fill(0);
        self.queued.push_back(buffer);
        Ok(())
    }

    pub(crate) fn state(&self) -> VoiceState {
        self.state
    }

    pub(crate) fn play(&mut self) {
        if !self.queued.is_empty() {
            self.state = VoiceState::Playing;
        }
    }

    pub(crate) fn stop(&mut self) {
        self.state = VoiceState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(depth: usize, block_len: usize) -> VoiceQueue {
        VoiceQueue::primed(VoiceConfig {
            sample_rate: 48000,
            block_len,
            queue_depth: depth,
        })
    }

    #[test]
    fn test_primed_with_silence() {
        let mut q = queue(2, 4);
        assert_eq!(q.state(), VoiceState::Playing);
        assert_eq!(q.queued_len(), 2);
        for _ in 0..4 {
            assert_eq!(q.next_sample(), Some(0));
        }
        assert_eq!(q.processed_len(), 1);
    }

    #[test]
    fn test_starves_after_last_buffer() {
        let mut q = queue(2, 2);
        for _ in 0..4 {
            assert!(q.next_sample().is_some());
        }
        assert_eq!(q.state(), VoiceState::Stopped);
        assert_eq!(q.next_sample(), None);
        assert_eq!(q.processed_len(), 2);
    }

    #[test]
    fn test_requeue_and_restart() {
        let mut q = queue(2, 2);
        for _ in 0..4 {
            q.next_sample();
        }
        q.requeue(&[7, 8]).unwrap();
        q.requeue(&[9]).unwrap();
        assert!(matches!(q.requeue(&[1, 2]), Err(crate::Error::NoProcessedBuffer)));

        q.play();
        let out: Vec<_> = (0..4).filter_map(|_| q.next_sample()).collect();
        assert_eq!(out, vec![7, 8, 9, 0]);
    }

    #[test]
    fn test_play_with_empty_queue_stays_stopped() {
        let mut q = queue(1, 1);
        q.next_sample();
        q.processed.clear();
        q.play();
        assert_eq!(q.state(), VoiceState::Stopped);
    }
}
