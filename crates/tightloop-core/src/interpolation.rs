//! Polynomial interpolation kernels for resampling.
//!
//! Every kernel takes a window of consecutive samples (indexed from zero) and
//! a target position `0 <= x <= window.len() - 1`, and returns the value of
//! the interpolating polynomial at `x`. Results are most accurate when `x`
//! sits near the window center, which is where the speed shifter keeps it.
//!
//! Coefficients for the closed-form kernels follow Olli Niemitalo's
//! "Polynomial Interpolators for High-Quality Resampling of Oversampled Audio".

use serde::{Deserialize, Serialize};

/// Signature shared by all kernels: `(window, target_position) -> value`.
pub type InterpolatorFn = fn(&[f64], f64) -> f64;

/// General N-point Lagrange interpolation.
///
/// O(N²) direct evaluation of the Lagrange basis polynomials. Slow; the
/// fixed-size kernels are the ones meant for real-time use.
pub fn lagrange_n(samples: &[f64], x: f64) -> f64 {
    let mut output = 0.0;
    for (j, &sample) in samples.iter().enumerate() {
        let mut basis = 1.0;
        for m in 0..samples.len() {
            if m == j {
                continue;
            }
            basis *= (x - m as f64) / (j as f64 - m as f64);
        }
        output += sample * basis;
    }
    output
}

/// 4-point, 3rd-order Lagrange.
#[inline]
pub fn lagrange_4pt_3ord(samples: &[f64], x: f64) -> f64 {
    let c0 = samples[1];
    let c1 = samples[2] - 1.0 / 3.0 * samples[0] - 0.5 * samples[1] - 1.0 / 6.0 * samples[3];
    let c2 = 0.5 * (samples[0] + samples[2]) - samples[1];
    let c3 = 1.0 / 6.0 * (samples[3] - samples[0]) + 0.5 * (samples[1] - samples[2]);
    let x1 = x - 1.0;
    ((c3 * x1 + c2) * x1 + c1) * x1 + c0
}

/// 6-point, 5th-order Lagrange.
#[inline]
pub fn lagrange_6pt_5ord(samples: &[f64], x: f64) -> f64 {
    let s13 = samples[1] + samples[3];
    let s04 = 1.0 / 24.0 * (samples[0] + samples[4]);

    let c0 = samples[2];
    let c1 = 1.0 / 20.0 * samples[0] - 0.5 * samples[1] - 1.0 / 3.0 * samples[2] + samples[3]
        - 0.25 * samples[4]
        + 1.0 / 30.0 * samples[5];
    let c2 = 2.0 / 3.0 * s13 - 5.0 / 4.0 * samples[2] - s04;
    let c3 = 5.0 / 12.0 * samples[2] - 7.0 / 12.0 * samples[3] + 7.0 / 24.0 * samples[4]
        - 1.0 / 24.0 * (samples[0] + samples[1] + samples[5]);
    let c4 = 0.25 * samples[2] - 1.0 / 6.0 * s13 + s04;
    let c5 = 1.0 / 120.0 * (samples[5] - samples[0])
        + 1.0 / 24.0 * (samples[1] - samples[4])
        + 1.0 / 12.0 * (samples[3] - samples[2]);

    let x2 = x - 2.0;
    ((((c5 * x2 + c4) * x2 + c3) * x2 + c2) * x2 + c1) * x2 + c0
}

/// 4-point, 3rd-order Hermite (Catmull-Rom).
///
/// Passes through the two central samples only.
#[inline]
pub fn hermite_4pt_3ord(samples: &[f64], x: f64) -> f64 {
    let c0 = samples[1];
    let c1 = 0.5 * (samples[2] - samples[0]);
    let c2 = samples[0] - 2.5 * samples[1] + 2.0 * samples[2] - 0.5 * samples[3];
    let c3 = 0.5 * (samples[3] - samples[0]) + 1.5 * (samples[1] - samples[2]);
    let x1 = x - 1.0;
    ((c3 * x1 + c2) * x1 + c1) * x1 + c0
}

/// 6-point, 3rd-order Hermite.
///
/// Passes through the two central samples only.
#[inline]
pub fn hermite_6pt_3ord(samples: &[f64], x: f64) -> f64 {
    let c0 = samples[2];
    let c1 = 1.0 / 12.0 * (samples[0] - samples[4]) + 2.0 / 3.0 * (samples[3] - samples[1]);
    let c2 = 1.25 * samples[1] - 7.0 / 3.0 * samples[2] + 5.0 / 3.0 * samples[3]
        - 0.5 * samples[4]
        + 1.0 / 12.0 * samples[5]
        - 1.0 / 6.0 * samples[0];
    let c3 = 1.0 / 12.0 * (samples[0] - samples[5])
        + 7.0 / 12.0 * (samples[4] - samples[1])
        + 4.0 / 3.0 * (samples[2] - samples[3]);
    let x2 = x - 2.0;
    ((c3 * x2 + c2) * x2 + c1) * x2 + c0
}

/// Interpolation strategy used by the speed shifter.
///
/// The window size is a property of the strategy, so a kernel can never be
/// evaluated against a window of the wrong width.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum Interpolator {
    /// Cheapest kernel with good audible quality.
    #[default]
    Hermite6Pt3Ord,
    Hermite4Pt3Ord,
    Lagrange4Pt3Ord,
    Lagrange6Pt5Ord,
    /// Reference Lagrange over an arbitrary even number of points.
    LagrangeN(usize),
    /// User kernel. Must return `window[j]` for integer `j` near the center.
    #[serde(skip)]
    Custom {
        window_size: usize,
        func: InterpolatorFn,
    },
}

impl Interpolator {
    /// Number of samples the kernel consults.
    pub fn window_size(&self) -> usize {
        match self {
            Interpolator::Hermite6Pt3Ord | Interpolator::Lagrange6Pt5Ord => 6,
            Interpolator::Hermite4Pt3Ord | Interpolator::Lagrange4Pt3Ord => 4,
            Interpolator::LagrangeN(n) => *n,
            Interpolator::Custom { window_size, .. } => *window_size,
        }
    }

    /// Evaluate the kernel over `window` at `x`.
    #[inline]
    pub fn interpolate(&self, window: &[f64], x: f64) -> f64 {
        debug_assert_eq!(window.len(), self.window_size());
        match self {
            Interpolator::Hermite6Pt3Ord => hermite_6pt_3ord(window, x),
            Interpolator::Hermite4Pt3Ord => hermite_4pt_3ord(window, x),
            Interpolator::Lagrange4Pt3Ord => lagrange_4pt_3ord(window, x),
            Interpolator::Lagrange6Pt5Ord => lagrange_6pt_5ord(window, x),
            Interpolator::LagrangeN(_) => lagrange_n(window, x),
            Interpolator::Custom { func, .. } => func(window, x),
        }
    }

    /// Whether the kernel can drive a speed shifter (even window of at least 2).
    pub fn is_valid(&self) -> bool {
        let size = self.window_size();
        size >= 2 && size % 2 == 0
    }

    pub fn name(&self) -> &'static str {
        match self {
            Interpolator::Hermite6Pt3Ord => "Hermite 6-point 3rd-order",
            Interpolator::Hermite4Pt3Ord => "Hermite 4-point 3rd-order",
            Interpolator::Lagrange4Pt3Ord => "Lagrange 4-point 3rd-order",
            Interpolator::Lagrange6Pt5Ord => "Lagrange 6-point 5th-order",
            Interpolator::LagrangeN(_) => "Lagrange N-point",
            Interpolator::Custom { .. } => "Custom",
        }
    }

    /// The closed-form kernels.
    pub fn all_fixed() -> &'static [Interpolator] {
        &[
            Interpolator::Hermite6Pt3Ord,
            Interpolator::Hermite4Pt3Ord,
            Interpolator::Lagrange4Pt3Ord,
            Interpolator::Lagrange6Pt5Ord,
        ]
    }
}
