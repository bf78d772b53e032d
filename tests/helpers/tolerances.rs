//! Tolerance constants for L16 stream testing.
//!
//! All values are in raw 16-bit sample units unless noted.

/// One quantization step. Output is truncated toward zero after
/// interpolation, so exact-in-theory results may land one step low.
pub const TRUNCATION_STEP: f64 = 1.0;

/// Interpolated smooth signals (sines with at least 32 samples per period).
/// Covers input rounding plus output truncation.
pub const SMOOTH_SIGNAL_EPSILON: f64 = 2.0;

/// 16-bit quantization step size on the normalized scale.
pub const INT16_EPSILON: f64 = 1.0 / 32768.0;
