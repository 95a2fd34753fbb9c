//! Background fill thread.

use super::StreamShared;
use crate::{Error, Result};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

pub(super) fn spawn_fill_thread(shared: Arc<StreamShared>) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("revmix-fill".into())
        .spawn(move || fill_loop(&shared))
        .map_err(Error::ThreadSpawn)
}

/// Fill whatever slots are free, then sleep until a slot comes back or the
/// wake interval passes. Shutdown is set under the state lock, so checking it
/// before each wait cannot miss the final notify.
fn fill_loop(shared: &StreamShared) {
    let interval = shared.config.fill_wake_interval();
    debug!(?interval, "fill thread started");

    let mut state = shared.state.lock();
    while !shared.shutdown.get() {
        if state.pool.input_len() > 0 {
            shared.fill_locked(&mut state);
        }
        shared.wake.wait_for(&mut state, interval);
    }

    debug!("fill thread stopped");
}
