//! # tightloop - Real-time Looping and Speed Shifting
//!
//! Sample-accurate looping and fractional speed shifting for interleaved
//! 16-bit stereo PCM streams.
//!
//! ## Architecture
//!
//! tightloop is an umbrella crate that coordinates:
//! - **tightloop-core** - L16 codec, interpolation kernels, circular window
//! - **tightloop-stream** - Looper, speed shifter and shared handles
//!
//! ## Quick Start
//!
//! ```ignore
//! use tightloop::prelude::*;
//!
//! let looper = LooperHandle::new(Looper::new(pcm, intro_end, loop_end));
//! let shifter = SpeedShifter::from_config(
//!     looper.clone(),
//!     ShifterConfig::new().speed(0.75).interpolator(Interpolator::Lagrange6Pt5Ord),
//! )?;
//!
//! player.play(&shifter);
//! looper.adjust_loop(intro_end, shorter_loop_end);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Core primitives plus stream adapters
//! - `stream` - [`Looper`], [`SpeedShifter`] and [`LooperHandle`]

/// Re-export of tightloop-core for direct access
pub use tightloop_core as core;

// Core types
pub use tightloop_core::{
    // Error
    Error,
    // Resampling
    InterpolationWindow,
    Interpolator,
    InterpolatorFn,
    Result,
    // Codec
    SAMPLE_SIZE,
};

pub use tightloop_core::{interpolation, sample};

// Stream adapters
#[cfg(feature = "stream")]
pub use tightloop_stream as stream;

#[cfg(feature = "stream")]
pub use tightloop_stream::{
    LoopRange, Looper, LooperHandle, ReadOutcome, ShifterConfig, SpeedShifter, StreamLength,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Error, Interpolator, Result, SAMPLE_SIZE};

    #[cfg(feature = "stream")]
    pub use crate::{
        LoopRange, Looper, LooperHandle, ReadOutcome, ShifterConfig, SpeedShifter, StreamLength,
    };
}
