//! Tolerance constants for mixer tests.

/// Floating point rounding errors (passthrough, exact gain).
pub const FLOAT_EPSILON: f64 = 1e-9;

/// One 16-bit quantization step, as an integer sample difference.
pub const INT16_LSB: i32 = 1;

/// Silence threshold in 16-bit samples.
pub const SILENCE_THRESHOLD: i16 = 0;
