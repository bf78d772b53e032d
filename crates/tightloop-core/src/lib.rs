//! PCM primitives shared by the tightloop stream components.
//!
//! - **sample**: L16 stereo codec with asymmetric normalization and clipping
//! - **interpolation**: Lagrange and Hermite kernels for fractional resampling
//! - **window**: fixed-capacity circular window feeding the kernels
//!
//! Nothing here locks or performs I/O; the stateful, thread-safe components
//! live in `tightloop-stream`.

mod error;
pub use error::{Error, Result};

pub mod interpolation;
pub mod sample;
pub mod window;

pub use interpolation::{Interpolator, InterpolatorFn};
pub use sample::SAMPLE_SIZE;
pub use window::InterpolationWindow;
