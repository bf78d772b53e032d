//! Shared handle to a looper.

use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Deref;
use std::sync::Arc;

use crate::looper::Looper;
use crate::source::StreamLength;

/// Cloneable handle to a [`Looper`].
///
/// Lets one clone feed a playback chain (for instance as the source of a
/// [`SpeedShifter`](crate::SpeedShifter)) while another clone adjusts loop
/// points from a control thread. All clones share the looper's lock.
///
/// # Example
/// ```ignore
/// let looper = LooperHandle::new(Looper::new(pcm, 0, 176_400));
/// let shifter = SpeedShifter::with_defaults(looper.clone());
/// std::thread::spawn(move || looper.adjust_loop(0, 88_200));
/// ```
pub struct LooperHandle<S> {
    looper: Arc<Looper<S>>,
}

impl<S> Clone for LooperHandle<S> {
    fn clone(&self) -> Self {
        Self {
            looper: Arc::clone(&self.looper),
        }
    }
}

impl<S> LooperHandle<S> {
    pub fn new(looper: Looper<S>) -> Self {
        Self {
            looper: Arc::new(looper),
        }
    }

    /// Recover the looper if this is the last handle.
    pub fn try_unwrap(self) -> Result<Looper<S>, Self> {
        Arc::try_unwrap(self.looper).map_err(|looper| Self { looper })
    }
}

impl<S> From<Looper<S>> for LooperHandle<S> {
    fn from(looper: Looper<S>) -> Self {
        Self::new(looper)
    }
}

impl<S> Deref for LooperHandle<S> {
    type Target = Looper<S>;

    fn deref(&self) -> &Looper<S> {
        &self.looper
    }
}

impl<S: Read + Seek> Read for LooperHandle<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.looper.read_io(buf)
    }
}

impl<S: Read + Seek> Seek for LooperHandle<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.looper.seek_to(pos)?)
    }
}

impl<S: StreamLength> StreamLength for LooperHandle<S> {
    fn byte_len(&self) -> u64 {
        self.looper.length()
    }
}
