//! Speed shifter configuration.

use serde::{Deserialize, Serialize};
use tightloop_core::{Error, Interpolator, Result};

/// Playback speed and interpolation kernel for a
/// [`SpeedShifter`](crate::SpeedShifter).
///
/// ## Speed
///
/// Input samples consumed per output sample: 1.0 = normal, 0.5 = half
/// speed (an octave down), 2.0 = double speed (an octave up).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ShifterConfig {
    pub speed: f64,
    pub interpolator: Interpolator,
}

impl ShifterConfig {
    /// Lower bound applied by [`ShifterConfig::speed`].
    pub const MIN_SPEED: f64 = 0.01;
    /// Upper bound applied by [`ShifterConfig::speed`].
    pub const MAX_SPEED: f64 = 16.0;

    /// Unit speed with the 6-point Hermite kernel.
    pub fn new() -> Self {
        Self {
            speed: 1.0,
            interpolator: Interpolator::default(),
        }
    }

    /// Set the speed, clamped to `[MIN_SPEED, MAX_SPEED]`.
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed.clamp(Self::MIN_SPEED, Self::MAX_SPEED);
        self
    }

    pub fn interpolator(mut self, interpolator: Interpolator) -> Self {
        self.interpolator = interpolator;
        self
    }

    pub fn window_size(&self) -> usize {
        self.interpolator.window_size()
    }

    /// Check the values a shifter would otherwise panic on.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_speed(self.speed) {
            return Err(Error::InvalidConfig(format!(
                "speed must be finite and positive, got {}",
                self.speed
            )));
        }
        if !self.interpolator.is_valid() {
            return Err(Error::InvalidConfig(format!(
                "interpolator window must be even and at least 2, got {}",
                self.window_size()
            )));
        }
        Ok(())
    }
}

impl Default for ShifterConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn is_valid_speed(speed: f64) -> bool {
    speed.is_finite() && speed > 0.0
}
