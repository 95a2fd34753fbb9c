//! # Engine Idle
//!
//! An idling engine on the default output device: exhaust noise fed by a
//! simulated physics thread, wind that rises with speed, and a low-passed kick
//! on every firing stroke.
//!
//! **Concepts:** streams, backends, static vs one-shot producers, inserts
//!
//! ```bash
//! RUST_LOG=revmix=debug cargo run --example engine_idle
//! ```

use revmix::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const PHYSICS_RATE: f64 = 2000.0;
const IDLE_RPM: f64 = 850.0;

fn main() -> revmix::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let stream = Arc::new(AudioStream::builder().sample_rate(SAMPLE_RATE).build()?);
    let mut backend = PlaybackBackend::open(BackendConfig::default())?;
    backend.add_stream(Arc::clone(&stream))?;
    backend.start()?;
    println!("Output: {}", backend.device_name());

    // Exhaust, driven by a fake combustion cycle.
    let (mut writer, reader) = engine_log(4096);
    stream.play(PlaybackEvent::new(LogDrivenSynth::new(reader, SAMPLE_RATE)).gain(0.8));

    let physics = thread::spawn(move || {
        let dt = 1.0 / PHYSICS_RATE;
        let firing_hz = IDLE_RPM / 60.0 * 2.0;
        for tick in 0..(PHYSICS_RATE as usize * 6) {
            let phase = (tick as f64 * dt * firing_hz).fract();
            let pulse = (-phase * 8.0).exp() as f32;
            let entry = LogEntry {
                pressure: 100_000.0 + 60_000.0 * pulse,
                velocity: 40.0 + 80.0 * pulse,
                dt,
            };
            while !writer.push(entry) {
                thread::sleep(Duration::from_millis(1));
            }
        }
        // Dropping the writer closes the log and lets the exhaust expire.
    });

    // Wind, static until told otherwise.
    let wind = FilteredNoise::new(SAMPLE_RATE);
    let control = wind.control();
    stream.play(PlaybackEvent::new(wind));

    // Kicks go through their own insert.
    let thump = stream.new_insert();
    stream.add_filter(thump, LowPassFilter::new(SAMPLE_RATE, 400.0))?;
    stream.set_insert_gain(thump, 0.6)?;

    let stroke = 60.0 / IDLE_RPM * 2.0;
    for i in 0..12 {
        let kick = ProceduralKick::new(
            KickParams {
                pitch: 0.2,
                decay: 0.5,
                ..Default::default()
            },
            SAMPLE_RATE,
        );
        stream.play_in(PlaybackEvent::new(kick).insert(thump), i as f64 * stroke);
    }

    for speed in [0.0, 20.0, 45.0, 70.0, 45.0, 10.0] {
        control.set_intensity(speed);
        println!("wind {speed:>5.1} | events {}", stream.event_count());
        thread::sleep(Duration::from_secs(1));
    }

    control.expire();
    let _ = physics.join();
    thread::sleep(Duration::from_millis(500));

    let metrics = stream.metrics();
    println!(
        "blocks {} | forced {} | late {} | resyncs {} | underruns {}",
        metrics.blocks_filled,
        metrics.forced_fills,
        metrics.late_drops,
        metrics.overrun_resyncs,
        backend.metrics().underruns
    );

    Ok(())
}
