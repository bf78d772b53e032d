//! Thread-safe L16 stereo stream adapters.
//!
//! Both adapters wrap any [`std::io::Read`] source, implement `Read`
//! themselves, and can be driven by a playback thread while a control thread
//! changes their parameters.
//!
//! # Features
//!
//! - **Looper**: plays `[0, loop_end)` once, then `[loop_start, loop_end)`
//!   forever; loop points can move during playback
//! - **Speed shifter**: fractional resampling at an adjustable speed, with
//!   pluggable Lagrange/Hermite interpolation
//! - **Handles**: cloneable `Arc` handles to share a looper between threads
//!
//! # Example
//!
//! ```ignore
//! use tightloop_stream::{LoopRange, Looper, LooperHandle, SpeedShifter};
//!
//! let looper = LooperHandle::new(Looper::new(pcm, 32, 9600));
//! let control = looper.clone();
//! let shifter = SpeedShifter::with_defaults(looper);
//!
//! // Playback thread
//! player.play(&shifter);
//!
//! // Control thread
//! control.adjust_loop(0, 4800);
//! shifter.set_speed(1.5);
//! ```

pub use tightloop_core::{Error, Result};

mod source;
pub use source::{ReadOutcome, StreamLength};

pub mod handle;
pub mod looper;
pub mod shifter;

pub use handle::LooperHandle;
pub use looper::{LoopRange, Looper};
pub use shifter::{ShifterConfig, SpeedShifter};
