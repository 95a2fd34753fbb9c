//! Error types for revmix-synth.

use thiserror::Error;

/// Result type alias for revmix-synth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing producers.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Clip contains no samples")]
    EmptyClip,

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),
}
