//! Centralized error type for the revmix umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] revmix_core::Error),

    #[error("Output: {0}")]
    Output(#[from] revmix_output::Error),

    #[cfg(feature = "synth")]
    #[error("Synth: {0}")]
    Synth(#[from] revmix_synth::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
