//! Property tests for the buffer pool and the mixer timeline.
//!
//! Run with:
//! ```bash
//! cargo test -p revmix --test pool_properties
//! ```

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::Constant;
use proptest::prelude::*;
use revmix::{BufferPool, Mixer, PlaybackEvent, StreamConfig};

#[derive(Debug, Clone, Copy)]
enum PoolOp {
    Fill,
    Consume,
    Release,
    Reclaim,
}

fn pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        Just(PoolOp::Fill),
        Just(PoolOp::Consume),
        Just(PoolOp::Release),
        Just(PoolOp::Reclaim),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every slot is always in exactly one place, and consumers see blocks in
    /// the order they were filled.
    #[test]
    fn pool_conserves_slots(size in 2usize..8, ops in prop::collection::vec(pool_op(), 0..64)) {
        let mut pool = BufferPool::new(size, 16);
        let mut held = Vec::new();
        let mut filled_order = std::collections::VecDeque::new();

        for op in ops {
            match op {
                PoolOp::Fill => {
                    if let Some(slot) = pool.take_input() {
                        filled_order.push_back(slot.id());
                        pool.publish(slot);
                    }
                }
                PoolOp::Consume => {
                    if let Some(slot) = pool.take_output() {
                        prop_assert_eq!(Some(slot.id()), filled_order.pop_front());
                        held.push(slot);
                    }
                }
                PoolOp::Release => {
                    if let Some(slot) = held.pop() {
                        pool.recycle(slot);
                    }
                }
                PoolOp::Reclaim => {
                    let reclaimed = pool.reclaim_output();
                    prop_assert_eq!(reclaimed, filled_order.len());
                    filled_order.clear();
                }
            }

            let occupancy = pool.occupancy();
            prop_assert_eq!(occupancy.total(), size);
            prop_assert_eq!(occupancy.checked_out, held.len());
            prop_assert_eq!(occupancy.output, filled_order.len());
        }
    }

    /// Absent overruns the cursor moves by exactly one block per fill,
    /// whatever is scheduled.
    #[test]
    fn timeline_is_monotonic(
        sample_rate in prop::sample::select(vec![22050u32, 44100, 48000, 88200]),
        block_len in 64usize..2048,
        starts in prop::collection::vec(-0.2f64..0.5, 0..16),
        blocks in 1usize..40,
    ) {
        let config = StreamConfig {
            sample_rate,
            block_len,
            ..Default::default()
        };
        let mut mixer = Mixer::new(&config).unwrap();
        for start in starts {
            mixer.submit_at(PlaybackEvent::new(Constant::new(0.01, 4096)), start);
        }

        let initial = mixer.buffer_time();
        let mut out = vec![0i16; block_len];
        let mut previous = initial;
        for n in 1..=blocks {
            mixer.fill_block(initial, &mut out);
            let now = mixer.buffer_time();
            prop_assert!(now > previous);
            let expected = initial + n as f64 * config.block_duration();
            prop_assert!((now - expected).abs() < 1e-9);
            previous = now;
        }
    }

    /// Quantized output never leaves the `i16` range implied by clamping.
    #[test]
    fn quantize_stays_in_range(samples in prop::collection::vec(-4.0f32..4.0, 1..256)) {
        let mut out = vec![0i16; samples.len()];
        revmix::core::pool::quantize(&samples, &mut out);
        for (&s, &o) in samples.iter().zip(&out) {
            prop_assert!((-32767..=32767).contains(&o));
            if s >= 1.0 {
                prop_assert_eq!(o, 32767);
            } else if s <= -1.0 {
                prop_assert_eq!(o, -32767);
            }
        }
    }
}
