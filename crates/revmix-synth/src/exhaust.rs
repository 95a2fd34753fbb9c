//! Exhaust noise driven by a physics log.
//!
//! An engine simulation pushes [`LogEntry`] samples at its own tick rate into
//! a bounded SPSC ring. [`LogDrivenSynth`] consumes them at audio rate,
//! holding the latest entry until the next tick boundary (each entry says how
//! long it lasts), and shapes white noise by the entry's pressure and flow
//! velocity.
//!
//! ```ignore
//! let (mut writer, reader) = engine_log(4096);
//! let exhaust = LogDrivenSynth::new(reader, 44100);
//! stream.play(PlaybackEvent::new(exhaust));
//!
//! // physics thread
//! writer.push(LogEntry { pressure, velocity, dt: 1.0 / 2000.0 });
//! ```

use crate::noise::NoiseSource;
use revmix_core::{AtomicFlag, SampleProducer};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::Arc;
use tracing::{debug, trace};

/// One physics sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogEntry {
    /// Exhaust pressure in Pa
    pub pressure: f32,
    /// Exhaust flow velocity in m/s
    pub velocity: f32,
    /// How long this entry holds, in seconds
    pub dt: f64,
}

/// Create a bounded physics log. The writer goes to the simulation, the
/// reader to a [`LogDrivenSynth`].
pub fn engine_log(capacity: usize) -> (EngineLogWriter, EngineLogReader) {
    let (producer, consumer) = HeapRb::<LogEntry>::new(capacity.max(1)).split();
    let closed = Arc::new(AtomicFlag::new(false));
    (
        EngineLogWriter {
            producer,
            closed: Arc::clone(&closed),
        },
        EngineLogReader { consumer, closed },
    )
}

/// Simulation side of the log.
pub struct EngineLogWriter {
    producer: HeapProd<LogEntry>,
    closed: Arc<AtomicFlag>,
}

impl EngineLogWriter {
    /// Append an entry. Returns `false` if the log is full and the entry was dropped.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        self.producer.try_push(entry).is_ok()
    }

    /// Free space in the log.
    pub fn vacant(&self) -> usize {
        self.producer.vacant_len()
    }

    /// Retire the synth reading this log.
    pub fn close(&self) {
        if !self.closed.get() {
            self.closed.set(true);
            debug!("engine log closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl Drop for EngineLogWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Synth side of the log.
pub struct EngineLogReader {
    consumer: HeapCons<LogEntry>,
    closed: Arc<AtomicFlag>,
}

impl EngineLogReader {
    pub fn len(&self) -> usize {
        self.consumer.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    #[inline]
    fn pop(&mut self) -> Option<LogEntry> {
        self.consumer.try_pop()
    }
}

/// Mapping from log values to noise level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExhaustParams {
    /// Pressure that produces silence, in Pa (default: 100000)
    pub ambient_pressure: f32,
    /// Pressure above ambient per unit of noise level (default: 2000000)
    pub pressure_scale: f32,
    /// Extra noise proportional to flow velocity (default: 0.0)
    pub turbulence: f32,
    /// Velocity giving full turbulence, in m/s (default: 340)
    pub velocity_scale: f32,
}

impl Default for ExhaustParams {
    fn default() -> Self {
        Self {
            ambient_pressure: 100_000.0,
            pressure_scale: 2_000_000.0,
            turbulence: 0.0,
            velocity_scale: 340.0,
        }
    }
}

pub struct LogDrivenSynth {
    log: EngineLogReader,
    params: ExhaustParams,
    noise: NoiseSource,
    current: LogEntry,
    sample_step: f64,
    /// Log time of the next sample, in seconds
    position: f64,
    /// Log time at which the held entry runs out
    next_tick: f64,
    pitch: f32,
    starved: bool,
}

impl LogDrivenSynth {
    pub fn new(log: EngineLogReader, sample_rate: u32) -> Self {
        Self::with_params(log, sample_rate, ExhaustParams::default(), NoiseSource::from_entropy())
    }

    pub fn with_params(
        log: EngineLogReader,
        sample_rate: u32,
        params: ExhaustParams,
        noise: NoiseSource,
    ) -> Self {
        Self {
            log,
            params,
            noise,
            current: LogEntry {
                pressure: params.ambient_pressure,
                velocity: 0.0,
                dt: 0.0,
            },
            sample_step: 1.0 / sample_rate as f64,
            position: 0.0,
            next_tick: 0.0,
            pitch: 1.0,
            starved: false,
        }
    }

    /// Entry currently being held.
    pub fn current(&self) -> LogEntry {
        self.current
    }

    /// Advance log time by one output sample and pop every entry whose tick
    /// has come. With nothing queued the last entry keeps holding.
    fn advance(&mut self) {
        self.position += self.sample_step * self.pitch as f64;
        while self.next_tick <= self.position {
            match self.log.pop() {
                Some(entry) => {
                    self.current = entry;
                    self.next_tick += entry.dt.max(0.0);
                    self.starved = false;
                }
                None => {
                    if !self.starved {
                        trace!(position = self.position, "engine log starved, holding");
                        self.starved = true;
                    }
                    self.next_tick = self.position;
                    break;
                }
            }
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        self.advance();
        let p = &self.params;
        let level = (self.current.pressure - p.ambient_pressure) / p.pressure_scale;
        let mut sample = self.noise.bipolar() * 0.5 * level;
        if p.turbulence > 0.0 {
            let flow = (self.current.velocity.abs() / p.velocity_scale).min(1.0);
            sample += self.noise.bipolar() * p.turbulence * flow;
        }
        sample
    }
}

impl SampleProducer for LogDrivenSynth {
    fn produce(&mut self, out: &mut [f32]) -> usize {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
        out.len()
    }

    fn accumulate(&mut self, out: &mut [f32], gain: f32) -> usize {
        for sample in out.iter_mut() {
            *sample += self.next_sample() * gain;
        }
        out.len()
    }

    fn duration(&self) -> f64 {
        0.0
    }

    fn has_expired(&self) -> bool {
        self.log.closed.get()
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;

    fn entry(pressure: f32, dt: f64) -> LogEntry {
        LogEntry {
            pressure,
            velocity: 0.0,
            dt,
        }
    }

    fn synth(reader: EngineLogReader, sample_rate: u32) -> LogDrivenSynth {
        LogDrivenSynth::with_params(
            reader,
            sample_rate,
            ExhaustParams::default(),
            NoiseSource::seeded(9),
        )
    }

    #[test]
    fn test_holds_entry_for_its_dt() {
        let (mut writer, reader) = engine_log(16);
        // 4.5 samples per entry at 1 kHz
        writer.push(entry(200_000.0, 0.0045));
        writer.push(entry(300_000.0, 0.0045));
        let mut synth = synth(reader, 1000);

        let mut out = [0.0f32; 4];
        synth.produce(&mut out);
        assert_eq!(synth.current().pressure, 200_000.0);
        synth.produce(&mut out);
        assert_eq!(synth.current().pressure, 300_000.0);
    }

    #[test]
    fn test_keeps_holding_when_starved() {
        let (mut writer, reader) = engine_log(4);
        writer.push(entry(250_000.0, 0.001));
        let mut synth = synth(reader, 1000);

        let mut out = [0.0f32; 64];
        synth.produce(&mut out);
        assert_eq!(synth.current().pressure, 250_000.0);
        assert!(out.iter().any(|&s| s != 0.0));

        writer.push(entry(120_000.0, 0.001));
        synth.produce(&mut out[..2]);
        assert_eq!(synth.current().pressure, 120_000.0);
    }

    #[test]
    fn test_ambient_pressure_is_silent() {
        let (mut writer, reader) = engine_log(4);
        writer.push(entry(100_000.0, 1.0));
        let mut synth = synth(reader, 1000);
        let mut out = [0.0f32; 32];
        synth.produce(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_level_scales_with_pressure() {
        let (mut writer, reader) = engine_log(4);
        writer.push(entry(2_100_000.0, 10.0));
        let mut synth = synth(reader, 1000);
        let mut out = [0.0f32; 256];
        synth.produce(&mut out);
        let peak = out.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= 0.5);
        assert!(peak > 0.3);
    }

    #[test]
    fn test_pitch_speeds_up_log_time() {
        let (mut writer, reader) = engine_log(16);
        for i in 0..8 {
            writer.push(entry(100_000.0 + i as f32, 0.0015));
        }
        let mut synth = synth(reader, 1000);
        synth.set_pitch(2.0);
        let mut out = [0.0f32; 2];
        synth.produce(&mut out);
        assert_relative_eq!(synth.position, 0.004, epsilon = 1e-12);
        assert_eq!(synth.current().pressure, 100_002.0);
    }

    #[test]
    fn test_expires_when_writer_closes() {
        let (writer, reader) = engine_log(4);
        let synth = synth(reader, 1000);
        assert!(synth.is_static());
        assert!(!synth.has_expired());
        drop(writer);
        assert!(synth.has_expired());
    }

    #[test]
    fn test_entries_cross_threads_in_order() {
        let (mut writer, reader) = engine_log(8);
        let last = 100_000.0 + 64.0 * 1000.0;

        let feeder = thread::spawn(move || {
            for i in 1..=64 {
                let next = entry(100_000.0 + i as f32 * 1000.0, 0.0045);
                while !writer.push(next) {
                    thread::yield_now();
                }
            }
        });

        let mut synth = synth(reader, 1000);
        let mut out = [0.0f32; 4];
        let mut held = vec![synth.current().pressure];
        for _ in 0..1_000_000 {
            synth.produce(&mut out);
            let pressure = synth.current().pressure;
            if held.last() != Some(&pressure) {
                held.push(pressure);
            }
            if pressure == last {
                break;
            }
            thread::yield_now();
        }
        feeder.join().unwrap();

        assert_eq!(held.last(), Some(&last));
        assert!(held.windows(2).all(|w| w[0] < w[1]), "out of order: {held:?}");
        assert!(synth.has_expired());
    }

    #[test]
    fn test_full_log_rejects_push() {
        let (mut writer, reader) = engine_log(2);
        assert!(writer.push(entry(1.0, 0.1)));
        assert!(writer.push(entry(2.0, 0.1)));
        assert!(!writer.push(entry(3.0, 0.1)));
        assert_eq!(writer.vacant(), 0);
        assert_eq!(reader.len(), 2);
    }
}
